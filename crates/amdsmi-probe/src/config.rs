use std::path::PathBuf;

use amdsmi::InitFlags;
use clap::Parser;
use clap::ValueEnum;
use utils::version;

/// Inventory of AMD sockets and processors reported by libamd_smi.
#[derive(Parser, Debug)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    /// Path to libamd_smi.so, tried before the default search locations
    #[arg(long, env = "AMDSMI_LIB_PATH", value_hint = clap::ValueHint::FilePath)]
    pub lib_path: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        env = "AMDSMI_PROBE_FORMAT"
    )]
    pub format: OutputFormat,

    /// Processor classes to initialize the library with
    #[arg(long, value_enum, default_value_t = ProcessorSelection::Gpus)]
    pub processors: ProcessorSelection,

    /// Buffer capacity, in bytes, for socket names
    #[arg(long, default_value_t = amdsmi::sys::LONG_STRING_LENGTH)]
    pub socket_name_len: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Influx,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProcessorSelection {
    Gpus,
    Cpus,
    All,
}

impl From<ProcessorSelection> for InitFlags {
    fn from(selection: ProcessorSelection) -> Self {
        match selection {
            ProcessorSelection::Gpus => InitFlags::AMD_GPUS,
            ProcessorSelection::Cpus => InitFlags::AMD_CPUS,
            ProcessorSelection::All => InitFlags::ALL_PROCESSORS,
        }
    }
}
