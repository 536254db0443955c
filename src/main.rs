use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use masjid_articles::config::Config;
use masjid_articles::credentials::FileTokenStore;
use masjid_articles::display::format_article_for_display;
use masjid_articles::form::ArticleForm;
use masjid_articles::manager::ArticleManager;
use masjid_articles::models::{
    ArticleStatus, FilterUpdate, SortBy, SortOrder, StatusFilter, UpdateArticleRequest,
};
use masjid_articles::repository::HttpArticleRepository;

#[derive(Parser)]
#[command(name = "masjid-admin")]
#[command(about = "Manage masjid website articles from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a page of articles
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long)]
        search: Option<String>,
        /// all, published, draft or pending
        #[arg(long)]
        status: Option<StatusFilter>,
        #[arg(short, long)]
        category: Option<String>,
        /// createdAt, publishedAt, views or title
        #[arg(long)]
        sort_by: Option<SortBy>,
        #[arg(long)]
        order: Option<SortOrder>,
    },
    Show {
        #[arg(short, long)]
        id: String,
        #[arg(long)]
        json: bool,
    },
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(long)]
        content: String,
        #[arg(short, long, default_value = "Kajian")]
        category: String,
        /// Comma separated
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long, default_value = "draft")]
        status: ArticleStatus,
        #[arg(long)]
        featured: bool,
    },
    Update {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        status: Option<ArticleStatus>,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
    /// Toggle the featured flag
    Feature {
        #[arg(short, long)]
        id: String,
    },
    Duplicate {
        #[arg(short, long)]
        id: String,
    },
    BulkDelete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Categories,
    Tags {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    Stats,
    /// Store or forget the API bearer token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    Set { token: String },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let tokens = Arc::new(FileTokenStore::new(&config.state_dir()));

    if let Commands::Token { action } = &cli.command {
        return match action {
            TokenAction::Set { token } => {
                tokens.save(token)?;
                println!("Token saved to {}", tokens.path().display());
                Ok(())
            }
            TokenAction::Clear => {
                tokens.clear()?;
                println!("Token removed");
                Ok(())
            }
        };
    }

    let repository = HttpArticleRepository::new(&config, tokens)
        .context("Failed to build HTTP client")?;
    let manager = ArticleManager::new(&config, Arc::new(repository));

    match cli.command {
        Commands::List {
            page,
            search,
            status,
            category,
            sort_by,
            order,
        } => {
            manager.store().write().set_filters(FilterUpdate {
                search,
                status,
                category,
                sort_by,
                sort_order: order,
            });
            manager.load_page(page).await;
            if manager.read(|s| s.error().is_some()) {
                return Err(store_error(&manager, "Failed to load articles"));
            }

            manager.read(|store| {
                for article in store.articles() {
                    let shown = format_article_for_display(article);
                    println!(
                        "{:<26} {:<16} {:<12} {:>6} views  {}{}",
                        article.id,
                        shown.status_label,
                        article.category,
                        article.views,
                        article.title,
                        if article.featured { " ★" } else { "" }
                    );
                }
                if let Some(p) = store.pagination() {
                    println!("\nPage {}/{} ({} articles)", p.page, p.total_pages, p.total);
                }
            });
        }
        Commands::Show { id, json } => {
            let article = manager
                .use_cases()
                .get_article(&id)
                .await?
                .ok_or_else(|| anyhow!("Article not found: {}", id))?;
            let shown = format_article_for_display(&article);
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("{}", article.title);
                println!("{} · {} · {} min read", shown.formatted_date, shown.status_label, shown.read_time);
                println!("Category: {}  Tags: {}", article.category, article.tags.join(", "));
                println!("\n{}\n\n{}", shown.short_description, article.content);
            }
        }
        Commands::Create {
            title,
            description,
            content,
            category,
            tags,
            image,
            status,
            featured,
        } => {
            let mut form = ArticleForm {
                title,
                description,
                content,
                image: image.unwrap_or_default(),
                status,
                category,
                featured,
                ..Default::default()
            };
            form.set_tags_from_str(&tags);

            manager.open_create();
            if !manager.handle_save(&form).await {
                return Err(store_error(&manager, "Article was not created"));
            }
            if let Some(article) = manager.read(|s| s.articles().first().cloned()) {
                println!("Created article {}", article.id);
            }
        }
        Commands::Update {
            id,
            title,
            description,
            content,
            category,
            status,
        } => {
            let article = manager
                .use_cases()
                .update_article(UpdateArticleRequest {
                    id,
                    title,
                    description,
                    content,
                    category,
                    status,
                    ..Default::default()
                })
                .await?;
            println!("Updated article {}", article.id);
        }
        Commands::Delete { id } => {
            if !manager.handle_delete(&id).await {
                return Err(store_error(&manager, "Article was not deleted"));
            }
            println!("Deleted article {}", id);
        }
        Commands::Feature { id } => {
            if !manager.handle_toggle_featured(&id).await {
                return Err(store_error(&manager, "Featured flag was not changed"));
            }
            println!("Toggled featured flag on {}", id);
        }
        Commands::Duplicate { id } => match manager.handle_duplicate(&id).await {
            Some(copy) => println!("Duplicated {} as {}", id, copy.id),
            None => return Err(store_error(&manager, "Article was not duplicated")),
        },
        Commands::BulkDelete { ids } => {
            let deleted = manager.handle_bulk_delete(&ids).await;
            if deleted == 0 {
                return Err(store_error(&manager, "No articles were deleted"));
            }
            println!("Deleted {} of {} articles", deleted, ids.len());
        }
        Commands::Categories => {
            for category in manager.use_cases().get_categories().await {
                println!("{}", category);
            }
        }
        Commands::Tags { limit } => {
            let limit = limit.unwrap_or(config.popular_tags_limit);
            for tag in manager.use_cases().get_popular_tags(limit).await {
                println!("{}", tag);
            }
        }
        Commands::Stats => {
            let stats = manager.use_cases().get_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Token { .. } => {}
    }

    Ok(())
}

fn store_error(manager: &ArticleManager, fallback: &str) -> anyhow::Error {
    let message = manager
        .read(|store| store.error().map(str::to_string))
        .unwrap_or_else(|| fallback.to_string());
    anyhow!(message)
}
