use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

mod commands;

#[derive(Parser)]
#[command(name = "brres")]
#[command(about = "BRRES/BMD 3D asset pipeline: SZS compression, archive inspection, .rspreset packing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Yaz0 (SZS) compression
    #[command(subcommand)]
    Szs(SzsCommands),
    /// Archive container inspection
    #[command(subcommand)]
    Brres(BrresCommands),
    /// `.rspreset` crate preset packing
    #[command(subcommand)]
    Preset(PresetCommands),
}

#[derive(Subcommand)]
enum SzsCommands {
    /// Decompress a Yaz0 stream
    Decode {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compress a file into a Yaz0 stream
    Encode {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Encoder to use. There is no implicit fallback between them.
        #[arg(short, long, value_enum, default_value_t = EncodeAlgo::Nintendo)]
        algo: EncodeAlgo,
    },
}

#[derive(Subcommand)]
enum BrresCommands {
    /// Print the textures, models and animations an archive contains
    Info {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum PresetCommands {
    /// Pack one model's material, plus the textures its samplers reference,
    /// out of an archive into a standalone `.rspreset`
    Pack {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        model: String,
        #[arg(long)]
        material: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Recorded verbatim in the preset's provenance header
        #[arg(long)]
        timestamp: String,
    },
    /// Unpack a `.rspreset`'s material info and textures
    Unpack {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodeAlgo {
    /// Every byte emitted as a literal; fast but the largest output.
    WorstCase,
    /// Nintendo's own Boyer-Moore-Horspool matcher.
    Nintendo,
    /// A from-scratch chained-hash-bucket matcher over CTGP's hash.
    Ctgp,
}

impl From<EncodeAlgo> for brres_core::szs::Algo {
    fn from(value: EncodeAlgo) -> Self {
        match value {
            EncodeAlgo::WorstCase => brres_core::szs::Algo::WorstCaseEncoding,
            EncodeAlgo::Nintendo => brres_core::szs::Algo::Nintendo,
            EncodeAlgo::Ctgp => brres_core::szs::Algo::Ctgp,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Szs(SzsCommands::Decode { input, output }) => {
            let pb = create_progress_bar("Decoding Yaz0 stream...");
            commands::szs_decode(&input, &output)?;
            pb.finish_with_message("Decode complete");
        }
        Commands::Szs(SzsCommands::Encode { input, output, algo }) => {
            let pb = create_progress_bar("Encoding Yaz0 stream...");
            commands::szs_encode(&input, &output, algo.into())?;
            pb.finish_with_message("Encode complete");
        }
        Commands::Brres(BrresCommands::Info { input }) => {
            commands::brres_info(&input)?;
        }
        Commands::Preset(PresetCommands::Pack {
            input,
            model,
            material,
            output,
            timestamp,
        }) => {
            let pb = create_progress_bar("Packing preset...");
            commands::preset_pack(&input, &model, &material, &output, &timestamp)?;
            pb.finish_with_message("Pack complete");
        }
        Commands::Preset(PresetCommands::Unpack { input, output_dir }) => {
            commands::preset_unpack(&input, &output_dir)?;
        }
    }

    Ok(())
}

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb
}
