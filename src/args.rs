use clap::Parser;

/// This is a harmonization program for Swiss communes and votation results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON run configuration: voting date, results URL, mutation window,
    /// line membership files, reference tables and join mode. For more information about
    /// the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory path or empty) If specified, the output files will be written to the given
    /// directory. Setting this option overrides the directory that may be specified with the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A reference copy of the final results file. If provided, the
    /// produced file is compared against it and any difference fails the run.
    #[clap(long, value_parser)]
    pub check: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
