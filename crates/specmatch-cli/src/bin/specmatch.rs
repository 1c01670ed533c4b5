use clap::{Parser, Subcommand};
use specmatch_cli::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Spectral library search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a query file against a spectral library, emitting one identification per query.
    Search {
        /// MGF-format query file.
        query_path: String,
        /// Spectral library file.
        library_path: String,
        /// Directory holding (or to hold) persisted ANN index files.
        #[arg(long, default_value = "./indices")]
        index_dir: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Build or refresh ANN indices for a library, one per charge present in it.
    RebuildIndex {
        library_path: String,
        #[arg(long, default_value = "./indices")]
        index_dir: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search { query_path, library_path, index_dir, config } => {
            run_search(&query_path, &library_path, &index_dir, config.into_config())
        }
        Commands::RebuildIndex { library_path, index_dir, config } => {
            run_rebuild(&library_path, &index_dir, config.into_config())
        }
    };

    if let Err(err) = result {
        eprintln!("specmatch: {}", err);
        std::process::exit(1);
    }
}

/// Runs a search. `SpectralLibraryReader` and `PeakAligner` are external collaborator
/// contracts (library-format parsing, peak alignment) supplied by a concrete backend
/// crate; this binary validates configuration and wires the driver but does not bundle
/// one.
fn run_search(
    _query_path: &str,
    _library_path: &str,
    _index_dir: &str,
    config: specmatch_core::Config,
) -> anyhow::Result<()> {
    config.validate()?;
    anyhow::bail!(
        "no SpectralLibraryReader/PeakAligner backend linked into this binary; \
         link a library-format crate implementing specmatch_core::library::{{SpectralLibraryReader, PeakAligner}}"
    );
}

fn run_rebuild(
    _library_path: &str,
    _index_dir: &str,
    config: specmatch_core::Config,
) -> anyhow::Result<()> {
    config.validate()?;
    anyhow::bail!(
        "no SpectralLibraryReader backend linked into this binary; \
         link a library-format crate implementing specmatch_core::library::SpectralLibraryReader"
    );
}
