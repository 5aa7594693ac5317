use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use mdsview_core::image::{Endian, MemoryImage};
use mdsview_core::{Address, Architecture, Category, Inspector, InspectorConfig, TableSink};
use mdsview_utils::{
    info, init_logging, init_logging_for_tui, init_logging_with_level, parse_register, parse_segment, parse_u64,
    LogFormat, LogLevel, LoggingGuard,
};

mod report;

/// Kernel object viewer for MDS RTOS targets.
#[derive(Parser, Debug)]
#[command(name = "mdsview")]
#[command(version)]
#[command(about = "Thread-aware kernel object viewer for MDS RTOS targets", long_about = None)]
struct Cli
{
    #[command(flatten)]
    target: TargetArgs,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true, env = "MDSVIEW_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    /// Console log format (pretty or json)
    #[arg(long, global = true, env = "MDSVIEW_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the target snapshot comes from and how its kernel was built
#[derive(Args, Debug)]
struct TargetArgs
{
    /// Firmware ELF providing symbols and initialized data
    #[arg(long, global = true, env = "MDSVIEW_ELF")]
    elf: Option<PathBuf>,

    /// Raw memory dump mapped at an address, as ADDR:PATH (repeatable)
    #[arg(long, global = true, value_parser = parse_segment)]
    ram: Vec<(u64, PathBuf)>,

    /// Live core register value, as NAME=VALUE (repeatable)
    #[arg(long = "register", global = true, value_parser = parse_register)]
    registers: Vec<(String, u64)>,

    /// Target is big endian (ignored when an ELF is given)
    #[arg(long, global = true, default_value_t = false)]
    big_endian: bool,

    /// Target pointer size in bytes
    #[arg(long, global = true, env = "MDSVIEW_POINTER_WIDTH")]
    pointer_width: Option<usize>,

    /// Size of MDS_Tick_t in bytes
    #[arg(long, global = true, env = "MDSVIEW_TICK_WIDTH")]
    tick_width: Option<usize>,

    /// Size of the kernel object name buffer
    #[arg(long, global = true, env = "MDSVIEW_NAME_SIZE")]
    name_size: Option<usize>,

    /// The kernel was built without memory heap statistics
    #[arg(long, global = true, env = "MDSVIEW_NO_HEAP_STATS", default_value_t = false)]
    no_heap_stats: bool,

    /// MDS_TIMER_SKIPLIST_LEVEL the kernel was built with
    #[arg(long, global = true, env = "MDSVIEW_TIMER_SKIPLIST_LEVEL")]
    timer_skiplist_level: Option<usize>,

    /// Cortex-M kernel built with FPU support (contexts carry exc_flag)
    #[arg(long, global = true, env = "MDSVIEW_ARM_FPU", default_value_t = false)]
    arm_fpu: bool,

    /// Maximum nodes visited per list walk
    #[arg(long, global = true, env = "MDSVIEW_TRAVERSAL_CAP")]
    cap: Option<usize>,

    /// Force the architecture instead of probing symbols (riscv or arm)
    #[arg(long, global = true, env = "MDSVIEW_ARCH")]
    arch: Option<Architecture>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Browse kernel objects (TUI unless --headless)
    Inspect
    {
        /// Print every visible category and exit
        #[arg(long, default_value_t = false)]
        headless: bool,
        /// Only show these optional categories (comma separated)
        #[arg(long, value_delimiter = ',')]
        show: Vec<Category>,
        /// Hide these optional categories (comma separated)
        #[arg(long, value_delimiter = ',')]
        hide: Vec<Category>,
        /// Auto-refresh period in the TUI; omit to refresh on demand
        #[arg(long, env = "MDSVIEW_REFRESH_MS")]
        refresh_ms: Option<u64>,
    },
    /// Decode the registers saved in a thread context
    Registers
    {
        /// Saved context pointer (the thread's stack pointer)
        #[arg(long, value_parser = parse_u64)]
        context: u64,
    },
    /// Show OS name, architecture and context-switch addresses
    Info,
}

fn main()
{
    let cli = Cli::parse();
    let tui = matches!(cli.command, Commands::Inspect { headless: false, .. });

    let guard = match init_logs(&cli, tui) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    let result = if tui { run_tui_command(cli) } else { run_command(cli) };

    // Flush the log file before exiting
    drop(guard);
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logs(cli: &Cli, tui: bool) -> Result<LoggingGuard, Box<dyn Error>>
{
    if tui {
        let (path, guard) = init_logging_for_tui(cli.log_level)?;
        eprintln!("Logging to {}", path.display());
        return Ok(guard);
    }
    let guard = match cli.log_level {
        Some(level) => init_logging_with_level(level, cli.log_format.unwrap_or_default())?,
        None => init_logging()?,
    };
    Ok(guard)
}

fn run_tui_command(cli: Cli) -> Result<(), Box<dyn Error>>
{
    let Commands::Inspect { show, hide, refresh_ms, .. } = cli.command else {
        return Err("the TUI is only available for inspect".into());
    };
    let inspector = open_target(&cli.target)?;
    let hidden = hidden_categories(&show, &hide);
    let refresh_interval = refresh_ms.map(Duration::from_millis);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mdsview_ui::run_tui(inspector, refresh_interval, &hidden))?;
    Ok(())
}

fn run_command(cli: Cli) -> Result<(), Box<dyn Error>>
{
    let inspector = open_target(&cli.target)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Inspect { show, hide, .. } => {
            let mut sink = TableSink::new();
            inspector.declare_schemas(&mut sink);
            for category in hidden_categories(&show, &hide) {
                sink.set_visible(category, false);
            }
            let summary = inspector.refresh(&mut sink)?;
            info!(failures = summary.failures(), "Headless refresh finished");
            report::write_tables(&mut stdout, &sink, &summary)?;
        }
        Commands::Registers { context } => {
            let context = Address::new(context);
            let registers = inspector.thread_registers(context)?;
            report::write_registers(&mut stdout, context, &registers)?;
        }
        Commands::Info => print_info(&inspector)?,
    }
    Ok(())
}

fn print_info(inspector: &Inspector<MemoryImage>) -> Result<(), Box<dyn Error>>
{
    println!("OS: {}", inspector.os_name());
    match inspector.architecture() {
        Ok(architecture) => println!("Architecture: {architecture}"),
        Err(e) => println!("Architecture: unknown ({e})"),
    }

    let switches = inspector.context_switch_addresses()?;
    if switches.is_empty() {
        println!("Context switch: not found");
    }
    for address in switches {
        println!("Context switch: {address}");
    }
    Ok(())
}

/// Build the memory image and an inspector over it
fn open_target(args: &TargetArgs) -> Result<Inspector<MemoryImage>, Box<dyn Error>>
{
    let mut image = match &args.elf {
        Some(path) => MemoryImage::from_elf(path)?,
        None if args.big_endian => MemoryImage::new(Endian::Big),
        None => MemoryImage::new(Endian::Little),
    };
    for (base, path) in &args.ram {
        image.load_dump(Address::new(*base), path)?;
    }
    for (name, value) in &args.registers {
        image.set_register(name, *value);
    }

    let inspector = Inspector::new(image, target_config(args))?;
    Ok(inspector)
}

fn target_config(args: &TargetArgs) -> InspectorConfig
{
    let mut config = InspectorConfig::default();
    if let Some(width) = args.pointer_width {
        config = config.with_pointer_width(width);
    }
    if let Some(width) = args.tick_width {
        config = config.with_tick_width(width);
    }
    if let Some(size) = args.name_size {
        config.name_size = size;
    }
    if let Some(level) = args.timer_skiplist_level {
        config = config.with_timer_skiplist_level(level);
    }
    if let Some(cap) = args.cap {
        config = config.with_traversal_cap(cap);
    }
    if let Some(architecture) = args.arch {
        config = config.with_architecture(architecture);
    }
    config.heap_stats = !args.no_heap_stats;
    config.with_arm_fpu(args.arm_fpu)
}

/// Optional categories to hide given `--show` and `--hide`
///
/// A non-empty `show` hides every optional category it does not name.
fn hidden_categories(show: &[Category], hide: &[Category]) -> Vec<Category>
{
    Category::ALL
        .into_iter()
        .filter(|category| !category.is_mandatory())
        .filter(|category| (!show.is_empty() && !show.contains(category)) || hide.contains(category))
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_hidden_categories()
    {
        assert!(hidden_categories(&[], &[]).is_empty());
        assert_eq!(
            hidden_categories(&[], &[Category::Timers, Category::Threads]),
            vec![Category::Timers]
        );

        let hidden = hidden_categories(&[Category::Semaphores], &[]);
        assert_eq!(hidden.len(), 7);
        assert!(!hidden.contains(&Category::Semaphores));
        assert!(!hidden.contains(&Category::Threads));
    }

    #[test]
    fn test_cli_builds_config()
    {
        let cli = Cli::try_parse_from([
            "mdsview",
            "inspect",
            "--headless",
            "--pointer-width",
            "8",
            "--cap",
            "16",
            "--arch",
            "riscv",
            "--no-heap-stats",
            "--timer-skiplist-level",
            "2",
            "--arm-fpu",
            "--ram",
            "0x20000000:ram.bin",
            "--register",
            "SP=0x20001000",
            "--hide",
            "devices,timers",
        ])
        .unwrap();

        let config = target_config(&cli.target);
        assert_eq!(config.pointer_width, 8);
        assert_eq!(config.traversal_cap, 16);
        assert_eq!(config.architecture, Some(Architecture::RiscV));
        assert!(!config.heap_stats);
        assert_eq!(config.timer_skiplist_level, 2);
        assert!(config.arm_fpu);
        assert_eq!(cli.target.ram, vec![(0x2000_0000, PathBuf::from("ram.bin"))]);
        assert_eq!(cli.target.registers, vec![("sp".to_string(), 0x2000_1000)]);
        assert!(matches!(
            cli.command,
            Commands::Inspect { headless: true, ref hide, .. } if hide == &[Category::Devices, Category::Timers]
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_category()
    {
        assert!(Cli::try_parse_from(["mdsview", "inspect", "--show", "sockets"]).is_err());
    }
}
