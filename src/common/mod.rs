pub mod errors;

/// Suffix of recordings eligible for conversion (compared case-insensitively).
pub const SOURCE_EXTENSION: &str = "ts";

/// Suffix of the converted artifact written next to its source.
pub const OUTPUT_EXTENSION: &str = "m4v";

/// Suffix of the recorder's sidecar log that travels with the source on success.
pub const SIDECAR_EXTENSION: &str = "log";

/// Suffix of claim markers inside the log namespace.
pub const MARKER_EXTENSION: &str = "claim";

pub const SUMMARY_HEADER: &str = "==== recast run summary ====";
pub const SUMMARY_FOOTER: &str = "==== end of summary ====";

pub const UNKNOWN_HOST: &str = "unknown-host";

#[cfg(windows)]
pub const DEFAULT_ENCODER_PATH: &str = r"C:\Program Files\HandBrake\HandBrakeCLI.exe";

#[cfg(not(windows))]
pub const DEFAULT_ENCODER_PATH: &str = "/usr/bin/HandBrakeCLI";

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// mp4 container, H.265 video, every subtitle track kept, optimized for streaming.
pub const DEFAULT_ARGUMENT_TEMPLATE: &[&str] = &[
    "-i",
    INPUT_PLACEHOLDER,
    "-o",
    OUTPUT_PLACEHOLDER,
    "--format",
    "av_mp4",
    "--encoder",
    "x265",
    "--all-subtitles",
    "--optimize",
];
