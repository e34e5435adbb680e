// CLI module for argument parsing and configuration

use crate::config::UserConfig;
use crate::domain::MediaKind;
use crate::feedback::FeedbackDurations;
use crate::source::{ScanOptions, ScanOrder};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Mswp - swipe through your photos and videos in the terminal
///
/// Keep what you love, mark the rest, and send the whole batch to the trash
/// when you are done.
#[derive(Parser, Debug, Clone)]
#[command(name = "mswp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the media library
    ///
    /// If not specified, defaults to the current directory.
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Only review the given media kind(s)
    ///
    /// Can be specified multiple times.
    /// Example: --kind photo --kind video
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kinds: Vec<MediaKindFilter>,

    /// Dry run mode - finishing reports success without touching any file
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Review the oldest items first instead of the newest
    #[arg(short = 'o', long = "oldest-first", action = ArgAction::SetTrue)]
    pub oldest_first: bool,

    /// Include hidden files (files starting with .)
    #[arg(long = "hidden", action = ArgAction::SetTrue)]
    pub show_hidden: bool,

    /// Minimum file size filter (e.g., "1KB", "5MB", "1GB")
    #[arg(long = "min-size")]
    pub min_size: Option<String>,

    /// Maximum file size filter (e.g., "100MB", "1GB")
    #[arg(long = "max-size")]
    pub max_size: Option<String>,

    /// Items requested per page (overrides the config file)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Drag distance in columns that commits a mouse swipe (overrides the config file)
    #[arg(long = "threshold")]
    pub threshold: Option<f32>,

    /// Finish without asking for confirmation
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    pub yes: bool,

    /// Write logs to this file instead of the cache directory
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKindFilter {
    /// Still images (jpg, png, heic, etc.)
    Photo,
    /// Videos (mp4, mov, mkv, etc.)
    Video,
}

impl From<MediaKindFilter> for MediaKind {
    fn from(filter: MediaKindFilter) -> Self {
        match filter {
            MediaKindFilter::Photo => MediaKind::Photo,
            MediaKindFilter::Video => MediaKind::Video,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn get_kind_filters(&self) -> Option<Vec<MediaKind>> {
        if self.kinds.is_empty() {
            None
        } else {
            Some(self.kinds.iter().map(|&k| k.into()).collect())
        }
    }

    /// Parse a size string (e.g., "5MB", "100KB") into bytes
    pub fn parse_size(size_str: &str) -> Option<u64> {
        let size_str = size_str.trim().to_uppercase();

        let (num_str, multiplier): (&str, u64) = if let Some(n) = size_str.strip_suffix("GB") {
            (n, 1024 * 1024 * 1024)
        } else if let Some(n) = size_str.strip_suffix("MB") {
            (n, 1024 * 1024)
        } else if let Some(n) = size_str.strip_suffix("KB") {
            (n, 1024)
        } else if let Some(n) = size_str.strip_suffix('B') {
            (n, 1)
        } else {
            (size_str.as_str(), 1)
        };

        let num: f64 = num_str.trim().parse().ok()?;
        if !num.is_finite() || num < 0.0 {
            return None;
        }

        Some((num * multiplier as f64) as u64)
    }

    pub fn get_min_size(&self) -> Option<u64> {
        self.min_size.as_ref().and_then(|s| Self::parse_size(s))
    }

    pub fn get_max_size(&self) -> Option<u64> {
        self.max_size.as_ref().and_then(|s| Self::parse_size(s))
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if !self.directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                self.directory.display()
            ));
        }

        if !self.directory.is_dir() {
            return Err(format!(
                "Path is not a directory: {}",
                self.directory.display()
            ));
        }

        if let Some(ref min) = self.min_size {
            if Self::parse_size(min).is_none() {
                return Err(format!(
                    "Invalid min-size format: '{}'. Use format like '5MB', '100KB', '1GB'",
                    min
                ));
            }
        }

        if let Some(ref max) = self.max_size {
            if Self::parse_size(max).is_none() {
                return Err(format!(
                    "Invalid max-size format: '{}'. Use format like '5MB', '100KB', '1GB'",
                    max
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.get_min_size(), self.get_max_size()) {
            if min > max {
                return Err(format!(
                    "min-size ({}) cannot be greater than max-size ({})",
                    self.min_size.as_deref().unwrap_or_default(),
                    self.max_size.as_deref().unwrap_or_default()
                ));
            }
        }

        if self.page_size == Some(0) {
            return Err("page-size must be at least 1".to_string());
        }

        if let Some(threshold) = self.threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(format!(
                    "threshold must be a positive number of columns, got {}",
                    threshold
                ));
            }
        }

        Ok(())
    }
}

/// Settings for one run: CLI arguments layered over the user config
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub kinds: Option<Vec<MediaKind>>,
    pub dry_run: bool,
    pub order: ScanOrder,
    pub show_hidden: bool,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub page_size: usize,
    pub prefetch_percent: u8,
    pub swipe_threshold: f32,
    pub confirm_finish: bool,
    pub feedback: FeedbackDurations,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: Args, user: &UserConfig) -> Self {
        AppConfig {
            kinds: args.get_kind_filters(),
            min_size: args.get_min_size(),
            max_size: args.get_max_size(),
            directory: args.directory,
            dry_run: args.dry_run,
            order: if args.oldest_first {
                ScanOrder::OldestFirst
            } else {
                ScanOrder::NewestFirst
            },
            show_hidden: args.show_hidden,
            page_size: args.page_size.unwrap_or(user.page_size),
            prefetch_percent: user.prefetch_percent,
            swipe_threshold: args.threshold.unwrap_or(user.swipe_threshold),
            confirm_finish: user.confirm_finish && !args.yes,
            feedback: user.feedback_durations(),
            log_file: args.log_file,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            kinds: self.kinds.clone(),
            show_hidden: self.show_hidden,
            min_size: self.min_size,
            max_size: self.max_size,
            order: self.order,
        }
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig::from_args(args, &UserConfig::default())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_args(Args::parse_from(["mswp"]), &UserConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            directory: PathBuf::from("."),
            kinds: vec![],
            dry_run: false,
            oldest_first: false,
            show_hidden: false,
            min_size: None,
            max_size: None,
            page_size: None,
            threshold: None,
            yes: false,
            log_file: None,
        }
    }

    mod args_tests {
        use super::*;

        #[test]
        fn test_parse_size_bytes() {
            assert_eq!(Args::parse_size("100"), Some(100));
            assert_eq!(Args::parse_size("100B"), Some(100));
            assert_eq!(Args::parse_size("0"), Some(0));
        }

        #[test]
        fn test_parse_size_suffixes() {
            assert_eq!(Args::parse_size("1.5KB"), Some(1536));
            assert_eq!(Args::parse_size("10MB"), Some(10 * 1024 * 1024));
            assert_eq!(Args::parse_size("1GB"), Some(1024 * 1024 * 1024));
            assert_eq!(Args::parse_size("1mb"), Some(1024 * 1024));
        }

        #[test]
        fn test_parse_size_invalid() {
            assert_eq!(Args::parse_size("abc"), None);
            assert_eq!(Args::parse_size("MB"), None);
            assert_eq!(Args::parse_size(""), None);
            assert_eq!(Args::parse_size("-5MB"), None);
        }

        #[test]
        fn test_kind_filter_conversion() {
            assert_eq!(MediaKind::from(MediaKindFilter::Photo), MediaKind::Photo);
            assert_eq!(MediaKind::from(MediaKindFilter::Video), MediaKind::Video);
        }

        #[test]
        fn test_parse_from_command_line() {
            let args = Args::parse_from([
                "mswp",
                "/photos",
                "--kind",
                "photo",
                "--kind",
                "video",
                "--oldest-first",
                "--page-size",
                "20",
                "--threshold",
                "4.5",
                "-y",
            ]);

            assert_eq!(args.directory, PathBuf::from("/photos"));
            assert_eq!(args.kinds.len(), 2);
            assert!(args.oldest_first);
            assert_eq!(args.page_size, Some(20));
            assert_eq!(args.threshold, Some(4.5));
            assert!(args.yes);
        }

        #[test]
        fn test_kind_filters_empty() {
            assert!(args().get_kind_filters().is_none());
        }

        #[test]
        fn test_validate_nonexistent_directory() {
            let args = Args {
                directory: PathBuf::from("/nonexistent/path/12345"),
                ..args()
            };

            let result = args.validate();
            assert!(result.unwrap_err().contains("does not exist"));
        }

        #[test]
        fn test_validate_invalid_size_format() {
            let args = Args {
                min_size: Some("invalid".to_string()),
                ..args()
            };
            assert!(args.validate().unwrap_err().contains("Invalid min-size"));
        }

        #[test]
        fn test_validate_min_greater_than_max() {
            let args = Args {
                min_size: Some("10MB".to_string()),
                max_size: Some("1MB".to_string()),
                ..args()
            };
            assert!(args
                .validate()
                .unwrap_err()
                .contains("cannot be greater than"));
        }

        #[test]
        fn test_validate_page_size_and_threshold() {
            let zero_page = Args {
                page_size: Some(0),
                ..args()
            };
            assert!(zero_page.validate().is_err());

            let bad_threshold = Args {
                threshold: Some(f32::NAN),
                ..args()
            };
            assert!(bad_threshold.validate().is_err());
        }

        #[test]
        fn test_validate_success() {
            let args = Args {
                min_size: Some("1KB".to_string()),
                max_size: Some("100MB".to_string()),
                page_size: Some(50),
                ..args()
            };
            assert!(args.validate().is_ok());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_app_config_from_args() {
            let args = Args {
                directory: PathBuf::from("/test/path"),
                kinds: vec![MediaKindFilter::Video],
                dry_run: true,
                oldest_first: true,
                show_hidden: true,
                min_size: Some("1KB".to_string()),
                max_size: Some("1MB".to_string()),
                ..args()
            };

            let config: AppConfig = args.into();

            assert_eq!(config.directory, PathBuf::from("/test/path"));
            assert!(config.dry_run);
            assert_eq!(config.order, ScanOrder::OldestFirst);
            assert!(config.show_hidden);
            assert_eq!(config.min_size, Some(1024));
            assert_eq!(config.max_size, Some(1024 * 1024));
            assert_eq!(config.kinds, Some(vec![MediaKind::Video]));

            let scan = config.scan_options();
            assert_eq!(scan.order, ScanOrder::OldestFirst);
            assert_eq!(scan.min_size, Some(1024));
        }

        #[test]
        fn test_cli_overrides_user_config() {
            let user = UserConfig {
                page_size: 30,
                swipe_threshold: 10.0,
                ..UserConfig::default()
            };

            let config = AppConfig::from_args(
                Args {
                    page_size: Some(5),
                    yes: true,
                    ..args()
                },
                &user,
            );

            assert_eq!(config.page_size, 5);
            assert_eq!(config.swipe_threshold, 10.0);
            assert!(!config.confirm_finish);
        }

        #[test]
        fn test_app_config_default() {
            let config = AppConfig::default();

            assert_eq!(config.directory, PathBuf::from("."));
            assert!(!config.dry_run);
            assert_eq!(config.order, ScanOrder::NewestFirst);
            assert_eq!(config.page_size, 100);
            assert_eq!(config.prefetch_percent, 70);
            assert!(config.confirm_finish);
            assert!(config.kinds.is_none());
        }
    }
}
