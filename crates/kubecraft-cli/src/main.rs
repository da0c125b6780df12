//! kubecraft CLI - Kubernetes manifests and Helm charts from small YAML specs

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod util;

#[derive(Parser)]
#[command(name = "kubecraft")]
#[command(author = "kubecraft Contributors")]
#[command(version)]
#[command(about = "Generate Kubernetes manifests and Helm charts from small YAML specs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the manifest bundle for an application spec
    Manifest {
        /// Application spec (YAML)
        app: PathBuf,

        /// Override the namespace set in the app file
        #[arg(short, long, env = "KUBECRAFT_NAMESPACE")]
        namespace: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a template file with Helm-style placeholders
    Template {
        /// Template file
        template: PathBuf,

        /// Context file (values, releaseName, chartName, namespace, chartVersion)
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Release name
        #[arg(long)]
        release: Option<String>,

        /// Release namespace
        #[arg(short, long, env = "KUBECRAFT_NAMESPACE")]
        namespace: Option<String>,

        /// Chart name
        #[arg(long)]
        chart_name: Option<String>,

        /// Chart version
        #[arg(long)]
        chart_version: Option<String>,
    },

    /// Scaffold a Helm chart for a container image
    Chart {
        /// Chart name
        name: String,

        /// Image repository
        #[arg(long)]
        image: String,

        /// Image tag
        #[arg(long, default_value = "latest")]
        tag: String,

        /// Service port
        #[arg(long, default_value_t = 80)]
        port: u16,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print rendered templates instead of writing the chart
        #[arg(long)]
        preview: bool,

        /// Release name used by --preview
        #[arg(long, default_value = "release")]
        release: String,

        /// Namespace used by --preview
        #[arg(short, long, default_value = "default", env = "KUBECRAFT_NAMESPACE")]
        namespace: String,
    },

    /// Validate a (multi-document) manifest file
    Validate {
        /// Manifest file
        path: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Manifest {
            app,
            namespace,
            output,
        } => commands::manifest::run(&app, namespace.as_deref(), output.as_deref()),

        Commands::Template {
            template,
            context,
            values,
            set,
            release,
            namespace,
            chart_name,
            chart_version,
        } => commands::template::run(
            &template,
            context.as_deref(),
            &values,
            &set,
            commands::template::Identity {
                release_name: release,
                namespace,
                chart_name,
                chart_version,
            },
        ),

        Commands::Chart {
            name,
            image,
            tag,
            port,
            output,
            preview,
            release,
            namespace,
        } => {
            if preview {
                commands::chart::preview(&name, &image, &tag, port, &release, &namespace)
            } else {
                commands::chart::run(&name, &image, &tag, port, &output)
            }
        }

        Commands::Validate { path } => commands::validate::run(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
