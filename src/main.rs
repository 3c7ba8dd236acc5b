//! # mdlabel CLI
//!
//! Command-line interface for rendering MiniDisc and album insert labels.
//!
//! ## Usage
//!
//! ```bash
//! # List built-in templates
//! mdlabel templates
//!
//! # Render a preview PNG with the on-screen guides
//! mdlabel render --title "Discovery" --artist "Daft Punk" --year 2001 \
//!     --artwork cover.jpg --trim-line --safe-zone --png preview.png
//!
//! # Export a print-ready PDF (file name derived from the label)
//! mdlabel export --template disc-surface --title "Discovery" --artist "Daft Punk"
//!
//! # Search album catalogs for artwork
//! mdlabel search "Daft Punk" "Discovery" --source deezer
//!
//! # Start the HTTP server
//! mdlabel serve --listen 0.0.0.0:8080
//! ```

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use mdlabel::{
    MdLabelError,
    catalog::{CatalogClient, CatalogConfig, CatalogSource, DiscogsCredentials, SpotifyCredentials},
    export,
    label::{
        ArtworkPosition, DEFAULT_ARTWORK_SCALE, DEFAULT_FONT_FAMILY, FontStyle, LabelData,
        LabelTheme, RenderOptions, RenderSnapshot,
    },
    render::{DefaultArtworkSource, FontBook, LabelRenderer, font::default_font_dirs},
    server::{self, ServerConfig},
    template::registry,
    units::Dpi,
};

/// mdlabel - MiniDisc and album insert label renderer
#[derive(Parser, Debug)]
#[command(name = "mdlabel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in templates
    Templates,

    /// Render a label to PNG
    Render {
        #[command(flatten)]
        label: LabelArgs,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Export a print-ready PDF (300 DPI, crop marks, exact physical size)
    Export {
        #[command(flatten)]
        label: LabelArgs,

        /// Output PDF file (defaults to a name derived from the label)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Search album catalogs for artwork
    Search {
        artist: String,
        album: String,

        /// Catalog to query (deezer, spotify, lastfm, discogs, itunes); all when omitted
        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Discord webhook receiving feedback submissions
        #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
        webhook_url: Option<String>,

        /// Additional font directory (repeatable)
        #[arg(long = "font-dir", value_name = "DIR")]
        font_dirs: Vec<PathBuf>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// Template id (see `mdlabel templates`)
    #[arg(long, default_value = "jewel-case")]
    template: String,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    artist: String,

    #[arg(long, default_value = "")]
    year: String,

    /// Artwork URL, data: URL or file path
    #[arg(long)]
    artwork: Option<String>,

    /// Font family
    #[arg(long, default_value = DEFAULT_FONT_FAMILY)]
    font: String,

    #[arg(long)]
    bold: bool,

    #[arg(long)]
    italic: bool,

    /// Capitalize words instead of upper-casing
    #[arg(long)]
    title_case: bool,

    /// Text region theme (light or dark)
    #[arg(long, default_value = "light")]
    theme: LabelTheme,

    /// Artwork horizontal offset in mm
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    art_x: f32,

    /// Artwork vertical offset in mm
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    art_y: f32,

    /// Artwork zoom
    #[arg(long, default_value_t = DEFAULT_ARTWORK_SCALE)]
    art_scale: f32,

    /// Render resolution (PNG only; PDF export always uses 300)
    #[arg(long, default_value_t = Dpi::PRINT.0)]
    dpi: u32,

    #[arg(long)]
    trim_line: bool,

    #[arg(long)]
    safe_zone: bool,

    #[arg(long)]
    crop_marks: bool,

    #[arg(long)]
    center_marks: bool,

    /// Additional font directory (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,
}

impl LabelArgs {
    fn snapshot(&self) -> Result<RenderSnapshot, MdLabelError> {
        let template = registry::by_id(&self.template).ok_or_else(|| {
            MdLabelError::Template(format!(
                "Unknown template '{}'. Run `mdlabel templates` to see available options.",
                self.template
            ))
        })?;

        let mut data = LabelData::new(&self.title, &self.artist, &self.year);
        if let Some(artwork) = &self.artwork {
            data = data.with_artwork(artwork);
        }

        let options = RenderOptions {
            dpi: Dpi(self.dpi),
            show_trim_line: self.trim_line,
            show_safe_zone: self.safe_zone,
            show_crop_marks: self.crop_marks,
            show_center_marks: self.center_marks,
            template: template.clone(),
            font_family: self.font.clone(),
            font_style: FontStyle {
                bold: self.bold,
                italic: self.italic,
                title_case: self.title_case,
            },
            artwork_position: ArtworkPosition {
                x: self.art_x,
                y: self.art_y,
                scale: self.art_scale,
            },
            label_theme: self.theme,
        };
        Ok(RenderSnapshot::new(data, options))
    }

    fn renderer(&self) -> Result<LabelRenderer, MdLabelError> {
        let fonts = font_book(&self.font_dirs);
        let artwork = DefaultArtworkSource::new()?;
        Ok(LabelRenderer::new(Arc::new(fonts), Arc::new(artwork)))
    }
}

#[derive(Args, Debug)]
struct CatalogArgs {
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    #[arg(long, env = "DISCOGS_KEY", hide_env_values = true)]
    discogs_key: Option<String>,

    #[arg(long, env = "DISCOGS_SECRET", hide_env_values = true)]
    discogs_secret: Option<String>,

    #[arg(long, env = "LASTFM_API_KEY", hide_env_values = true)]
    lastfm_api_key: Option<String>,
}

impl CatalogArgs {
    fn config(self) -> CatalogConfig {
        let spotify = match (self.spotify_client_id, self.spotify_client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        let discogs = self.discogs_key.map(|key| DiscogsCredentials {
            key,
            secret: self.discogs_secret,
        });

        CatalogConfig {
            spotify,
            discogs,
            lastfm_api_key: self.lastfm_api_key,
        }
    }
}

fn font_book(extra_dirs: &[PathBuf]) -> FontBook {
    if extra_dirs.is_empty() {
        return FontBook::system();
    }
    let mut dirs = extra_dirs.to_vec();
    dirs.extend(default_font_dirs());
    FontBook::with_dirs(&dirs)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "mdlabel=debug,info" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MdLabelError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Templates => {
            for (category, templates) in registry::by_category() {
                println!("{}:", category);
                for t in templates {
                    println!(
                        "  {:<20} {:<28} {}×{}mm (+{}mm bleed)",
                        t.id, t.display_name, t.width_mm, t.height_mm, t.bleed_mm
                    );
                }
            }
            Ok(())
        }

        Commands::Render { label, png } => {
            let snapshot = label.snapshot()?;
            let mut renderer = label.renderer()?;
            let bytes = runtime.block_on(export::render_png(&mut renderer, &snapshot))?;
            std::fs::write(&png, bytes)?;
            println!("Saved {}", png.display());
            Ok(())
        }

        Commands::Export { label, out } => {
            let snapshot = label.snapshot()?;
            let mut renderer = label.renderer()?;
            let today = Utc::now().date_naive();
            let pdf = runtime.block_on(export::render_pdf(&mut renderer, &snapshot, today))?;
            let path = out.unwrap_or_else(|| PathBuf::from(&pdf.file_name));
            std::fs::write(&path, pdf.bytes)?;
            println!("Saved {}", path.display());
            Ok(())
        }

        Commands::Search {
            artist,
            album,
            source,
            catalog,
        } => {
            let client = CatalogClient::new(catalog.config())?;
            let hits = runtime.block_on(async {
                match source {
                    Some(name) => {
                        let source: CatalogSource = name.parse()?;
                        client.search(source, &artist, &album).await
                    }
                    None => Ok(client.search_all(&artist, &album).await),
                }
            })?;

            if hits.is_empty() {
                println!("No matches.");
            }
            for hit in hits {
                println!(
                    "[{}] {} - {} ({})\n    {}",
                    hit.source,
                    hit.artist,
                    hit.title,
                    if hit.year.is_empty() { "?" } else { hit.year.as_str() },
                    hit.artwork_url.as_deref().unwrap_or("no artwork")
                );
            }
            Ok(())
        }

        Commands::Serve {
            listen,
            webhook_url,
            font_dirs,
            catalog,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                catalog: catalog.config(),
                webhook_url,
                font_dirs,
                ..ServerConfig::default()
            };
            runtime.block_on(server::serve(config))
        }
    }
}
