pub mod formatter;

pub use formatter::{
    format_breakdown, format_json, format_population, format_score, format_summary, format_table,
    format_tsv, should_use_colors, write_report, Report,
};
