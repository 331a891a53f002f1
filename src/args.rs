use clap::Parser;

/// This program computes the digital transformation index of firms from the keyword counts
/// of their annual reports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the run: the input files, the columns and the rules.
    /// See the manual of the dt_index crate for the format of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, dtindex will
    /// check that the summary of this run matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory) Where the four output tables are written. Setting this option overrides the
    /// directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the run will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path or empty) The input file. Setting this option overrides the file sources of the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default: from the file extension, xlsx otherwise) The type of the input: xlsx or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (list of column names or not specified) The declared indicator columns. The declared
    /// indicators that are missing from the input are reported and ignored.
    #[clap(long, value_parser)]
    pub indicators: Option<Vec<String>>,

    /// (default 0.85) The share of the variance that the retained principal components must explain.
    #[clap(long, value_parser)]
    pub threshold: Option<f64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
