//! Command-line flags.

use std::net::SocketAddr;

pub const USAGE: &str = "\
usage: lumen [options]

  -v, --verbose          log at debug level
      --preset <name>    load a preset (name in the preset directory, or a path)
      --save <name>      save a preset on exit
      --listen <addr>    OSC listen address, or `off`
      --feedback <addr>  OSC feedback target
      --frames <n>       run n frames, then exit
      --list-presets     print saved preset names
  -h, --help             show this message";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Listen {
    /// Use the address from the configuration file.
    #[default]
    Config,
    Off,
    Addr(SocketAddr),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Options {
    pub verbose: bool,
    pub help: bool,
    pub list_presets: bool,
    pub preset: Option<String>,
    pub save: Option<String>,
    pub listen: Listen,
    pub feedback: Option<SocketAddr>,
    pub frames: Option<u64>,
}

impl Options {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut opts = Options::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let flag = arg.as_str();
            match flag {
                "-v" | "--verbose" => opts.verbose = true,
                "-h" | "--help" => opts.help = true,
                "--list-presets" => opts.list_presets = true,
                "--preset" => opts.preset = Some(take_value(flag, iter.next())?),
                "--save" => opts.save = Some(take_value(flag, iter.next())?),
                "--listen" => {
                    let v = take_value(flag, iter.next())?;
                    opts.listen = if v == "off" { Listen::Off } else { Listen::Addr(parse_addr(&v)?) };
                }
                "--feedback" => opts.feedback = Some(parse_addr(&take_value(flag, iter.next())?)?),
                "--frames" => {
                    let v = take_value(flag, iter.next())?;
                    opts.frames = Some(v.parse().map_err(|_| format!("--frames: not a count: {}", v))?);
                }
                other => return Err(format!("unknown option {}", other)),
            }
        }
        Ok(opts)
    }
}

fn take_value(flag: &str, next: Option<&String>) -> Result<String, String> {
    next.cloned().ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_addr(s: &str) -> Result<SocketAddr, String> {
    s.parse().map_err(|_| format!("not a socket address: {}", s))
}
