//! slidegen CLI - PowerPoint deck generation
//!
//! Serves the web form, generates decks from the command line and exports
//! the built-in template frames.

mod config;
mod server;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use slidegen::{DeckRequest, RetentionPolicy, TemplateRegistry, TemplateStyle};
use std::fs;
use std::path::PathBuf;

/// Template-driven PowerPoint deck generation
#[derive(Parser)]
#[command(
    name = "slidegen",
    author = "iyulab",
    version,
    about = "Generate PowerPoint decks from templates",
    long_about = "slidegen - Template-driven PowerPoint deck generation.\n\n\
                  Serves a web form or builds decks from the command line using \
                  light, normal and dark templates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web form
    Serve {
        /// Address to listen on (overrides SLIDEGEN_BIND)
        #[arg(short, long)]
        bind: Option<String>,

        /// Directory for generated decks (overrides SLIDEGEN_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Directory holding light/normal/dark.pptx (overrides SLIDEGEN_TEMPLATE_DIR)
        #[arg(short, long)]
        template_dir: Option<PathBuf>,

        /// Fail instead of using built-in frames for missing template files
        #[arg(long)]
        no_builtin_fallback: bool,

        /// keep, delete-after-send or max-age=<secs> (overrides SLIDEGEN_RETENTION)
        #[arg(long)]
        retention: Option<RetentionPolicy>,

        /// Largest accepted slide count (overrides SLIDEGEN_MAX_SLIDES)
        #[arg(long)]
        max_slides: Option<i64>,
    },

    /// Generate a deck without the web form
    #[command(visible_alias = "gen")]
    Generate {
        /// Deck title
        #[arg(short, long)]
        title: String,

        /// Author shown on the title slide
        #[arg(short, long)]
        author: String,

        /// Topic text; the first non-empty line is used
        #[arg(short, long, default_value = "")]
        content: String,

        /// Total number of slides, title slide included (at most SLIDEGEN_MAX_SLIDES)
        #[arg(short = 'n', long, default_value = "5")]
        slides: i64,

        /// Template style
        #[arg(short = 's', long, default_value = "light")]
        style: Style,

        /// Directory holding template files (default: built-in frames)
        #[arg(long)]
        template_dir: Option<PathBuf>,

        /// Output file path (default: "{title}.pptx")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the built-in light/normal/dark frames to a directory
    Frames {
        /// Output directory
        #[arg(short, long, default_value = "frame")]
        output: PathBuf,
    },

    /// Show the slides of a deck
    Info {
        /// Input file path
        input: PathBuf,

        /// Print the parsed deck as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Template style
#[derive(Clone, Copy, ValueEnum)]
enum Style {
    Light,
    Normal,
    Dark,
}

impl From<Style> for TemplateStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Light => TemplateStyle::Light,
            Style::Normal => TemplateStyle::Normal,
            Style::Dark => TemplateStyle::Dark,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve {
            bind,
            output_dir,
            template_dir,
            no_builtin_fallback,
            retention,
            max_slides,
        } => {
            let mut config = Config::load()?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(dir) = template_dir {
                config.template_dir = dir;
            }
            if no_builtin_fallback {
                config.builtin_fallback = false;
            }
            if let Some(policy) = retention {
                config.retention = policy;
            }
            if let Some(max) = max_slides {
                config.max_slides = max;
            }

            println!(
                "{} Serving on {}",
                "▶".green().bold(),
                format!("http://{}", config.bind).underline()
            );
            actix_web::rt::System::new().block_on(server::serve(config))?;
        }

        Commands::Generate {
            title,
            author,
            content,
            slides,
            style,
            template_dir,
            output,
        } => {
            let max_slides = Config::load()?.max_slides;
            if slides > max_slides {
                return Err(format!("--slides must be at most {}", max_slides).into());
            }

            let style = TemplateStyle::from(style);
            let pb = create_spinner("Loading templates...");

            let registry = match template_dir {
                Some(dir) => TemplateRegistry::from_dir(dir, true)?,
                None => TemplateRegistry::builtin()?,
            };

            pb.set_message("Assembling deck...");
            let request = DeckRequest::from_form(&title, &author, &content, slides);
            let bytes = slidegen::generate(&registry, style.as_str(), &request)?;

            let output = output.unwrap_or_else(|| PathBuf::from(server::download_name(&title)));
            fs::write(&output, &bytes)?;
            pb.finish_and_clear();

            println!(
                "{} Generated {} slide(s) with the {} template: {}",
                "✓".green().bold(),
                1 + request.content_slide_count(),
                style,
                output.display()
            );
        }

        Commands::Frames { output } => {
            let pb = create_spinner("Building frames...");
            let paths = slidegen::templates::export_builtin(&output)?;
            pb.finish_and_clear();

            for path in paths {
                println!("{} {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Info { input, json } => {
            let pb = create_spinner("Reading deck...");

            let format = slidegen::detect_format_from_path(&input)?;
            let doc = slidegen::parse_file(&input)?;

            pb.finish_and_clear();

            if json {
                println!("{}", doc.to_json()?);
                return Ok(());
            }

            println!("{}", "Deck Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), format);
            println!("{}: {}", "Slides".bold(), doc.sections.len());

            if let Some(ref title) = doc.metadata.title {
                println!("{}: {}", "Title".bold(), title);
            }
            if let Some(ref author) = doc.metadata.author {
                println!("{}: {}", "Author".bold(), author);
            }
            if let Some(ref modified) = doc.metadata.modified {
                println!("{}: {}", "Modified".bold(), modified);
            }

            println!("\n{}", "Slides".cyan().bold());
            println!("{}", "─".repeat(40));
            for section in &doc.sections {
                let title = section.title().unwrap_or_default();
                println!("{:>3}. {}", section.index + 1, title.bold());
                if let Some(subtitle) = section.subtitle() {
                    println!("     {}", subtitle);
                }
                for para in section.body() {
                    println!("     {}", para.plain_text().dimmed());
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "slidegen".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Template-driven PowerPoint deck generation");
    println!();
    println!(
        "Templates: {}",
        TemplateStyle::ALL.map(|s| s.as_str()).join(", ")
    );
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
