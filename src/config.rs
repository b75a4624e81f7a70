use std::path::PathBuf;

use clap::Parser;

use crate::chart::HistogramSpec;

/// Startup configuration for the dashboard.
#[derive(Parser, Debug)]
#[command(name = "ipo-lens")]
#[command(about = "Interactive dashboard for Indian IPO listing performance", long_about = None)]
pub struct Config {
    /// CSV file with one row per IPO.
    #[arg(short, long, env = "IPO_LENS_DATA", default_value = "Indian_IPO_Market_Data.csv")]
    pub data: PathBuf,

    /// Initial number of histogram bins (clamped to 5..=100).
    #[arg(short, long, default_value_t = HistogramSpec::DEFAULT_BINS)]
    pub bins: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_standard_file() {
        let config = Config::try_parse_from(["ipo-lens"]).expect("parse");
        if std::env::var_os("IPO_LENS_DATA").is_none() {
            assert_eq!(config.data, PathBuf::from("Indian_IPO_Market_Data.csv"));
        }
        assert_eq!(config.bins, HistogramSpec::DEFAULT_BINS);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from(["ipo-lens", "--data", "ipos.csv", "-b", "12"]).expect("parse");
        assert_eq!(config.data, PathBuf::from("ipos.csv"));
        assert_eq!(config.bins, 12);
    }
}
