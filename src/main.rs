use clap::{Parser, Subcommand};
use folio::authoring::Authoring;
use folio::store::ContentStore;
use folio::types::ItemInput;
use folio::{config, output, server};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Local authoring server and page generator for a hand-built personal site")]
#[command(long_about = "\
Local authoring server and page generator for a hand-built personal site

The site directory is the data source. Every note and book is a standalone
HTML page whose metadata lives in comments at the top of the file.

Site structure:

  site/
  ├── site.toml                 # Optional config (see 'folio gen-config')
  ├── index.html                # Homepage with generated regions
  ├── sitemap.xml               # Rewritten on every save
  ├── posts/                    # Notes: posts/<id>.html
  ├── library/                  # Books: library/<id>.html
  └── images/books/             # Covers: images/books/<id>.jpg

Front matter (first occurrence wins, unknown keys ignored):

  <!-- Title: Hello World -->
  <!-- Description: First note -->
  <!-- Tags: rust, web -->
  <!-- Created: March 3, 2024 -->
  <!-- Section: Technology -->
  <!-- Type: note -->

Pages without front matter are read through their <title>, meta tags and
markup, and gain front matter the next time they are saved.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local editor API and serve the site
    Serve {
        /// Bind address (overrides site.toml)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides site.toml)
        #[arg(long)]
        port: Option<u16>,
    },
    /// List notes and books, newest first
    List,
    /// Create a note or book from the command line
    New {
        /// Title; the id is derived from it
        title: String,
        #[arg(long)]
        section: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// HTML body
        #[arg(long)]
        content: Option<String>,
        /// Book author
        #[arg(long)]
        author: Option<String>,
        /// Book publication year
        #[arg(long)]
        year: Option<String>,
    },
    /// Rewrite the homepage regions and the sitemap
    Regenerate,
    /// Rewrite only the homepage regions
    Homepage,
    /// Rewrite only the sitemap
    Sitemap,
    /// Re-render every item through the current page template
    Rerender,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("folio=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { host, port } => {
            let authoring = open_site(&cli.root)?;
            let server_config = &authoring.config().server;
            let host = host.unwrap_or_else(|| server_config.host.clone());
            let port = port.unwrap_or(server_config.port);
            let addr: SocketAddr = format!("{host}:{port}").parse()?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(Arc::new(authoring), addr))?;
        }
        Command::List => {
            let authoring = open_site(&cli.root)?;
            let items = authoring.list()?;
            output::print_list_output(&items);
        }
        Command::New {
            title,
            section,
            description,
            tags,
            content,
            author,
            year,
        } => {
            let authoring = open_site(&cli.root)?;
            let input = ItemInput {
                title: Some(title),
                description,
                tags,
                section,
                content,
                author,
                year,
            };
            let outcome = authoring.create(input, None)?;
            output::print_write_outcome(&outcome);
        }
        Command::Regenerate => {
            let authoring = open_site(&cli.root)?;
            let outcome = authoring.regenerate()?;
            output::print_regenerate_outcome(&outcome);
        }
        Command::Homepage => {
            let authoring = open_site(&cli.root)?;
            let outcome = authoring.update_homepage()?;
            output::print_lines(output::format_homepage_outcome(&outcome));
        }
        Command::Sitemap => {
            let authoring = open_site(&cli.root)?;
            let outcome = authoring.update_sitemap()?;
            output::print_lines(output::format_sitemap_outcome(&outcome));
        }
        Command::Rerender => {
            let authoring = open_site(&cli.root)?;
            let outcome = authoring.rerender()?;
            output::print_rerender_outcome(&outcome);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `site.toml` under `root` and wire the production authoring stack.
fn open_site(root: &Path) -> Result<Authoring, config::ConfigError> {
    let site_config = config::load_config(root)?;
    Ok(Authoring::new(ContentStore::new(root, site_config)))
}
