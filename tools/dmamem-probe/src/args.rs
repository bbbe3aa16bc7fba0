use dmamem_vmem::{CachePolicy, ParseCachePolicyError};
use log::LevelFilter;
use std::path::PathBuf;

pub const USAGE: &str = "usage: dmamem-probe [--policy write_combining|uncached|cached] \
[--log off|error|warn|info|debug|trace] [DTB]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub policy: CachePolicy,
    pub log: LevelFilter,
    /// Flattened device tree to load instead of the built-in one.
    pub dtb: Option<PathBuf>,
    pub help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            log: LevelFilter::Info,
            dtb: None,
            help: false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("{0} expects a value")]
    MissingValue(&'static str),
    #[error(transparent)]
    Policy(#[from] ParseCachePolicyError),
    #[error("unknown log level `{0}`")]
    Level(String),
    #[error("unexpected argument `{0}`")]
    Unexpected(String),
}

impl Args {
    /// Parse the arguments following the program name.
    ///
    /// # Errors
    /// See [`ArgsError`].
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut out = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => out.help = true,
                "--policy" => {
                    let v = args.next().ok_or(ArgsError::MissingValue("--policy"))?;
                    out.policy = v.parse()?;
                }
                "--log" => {
                    let v = args.next().ok_or(ArgsError::MissingValue("--log"))?;
                    out.log = v.parse().map_err(|_| ArgsError::Level(v))?;
                }
                s if s.starts_with('-') || out.dtb.is_some() => {
                    return Err(ArgsError::Unexpected(arg));
                }
                _ => out.dtb = Some(PathBuf::from(arg)),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(s.iter().map(ToString::to_string))
    }

    #[test]
    fn defaults() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn all_options() {
        let a = parse(&["--policy", "uncached", "--log", "debug", "board.dtb"]).unwrap();
        assert_eq!(a.policy, CachePolicy::Uncached);
        assert_eq!(a.log, LevelFilter::Debug);
        assert_eq!(a.dtb, Some(PathBuf::from("board.dtb")));
    }

    #[test]
    fn bad_input() {
        assert_eq!(parse(&["--log"]), Err(ArgsError::MissingValue("--log")));
        assert_eq!(
            parse(&["--log", "loud"]),
            Err(ArgsError::Level("loud".into()))
        );
        assert!(matches!(
            parse(&["--policy", "fast"]),
            Err(ArgsError::Policy(_))
        ));
        assert_eq!(
            parse(&["a.dtb", "b.dtb"]),
            Err(ArgsError::Unexpected("b.dtb".into()))
        );
    }
}
