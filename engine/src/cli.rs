//! Utility module for command line interfaces

use std::{error::Error, fmt, fmt::Display, str::FromStr};

/// An error struct to wrap simple static error messages
#[derive(Debug)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for CliErr {}

/// Parse the next positional argument, `missing` is the error message if there is none.
pub fn parse_arg<T, I>(args: &mut I, missing: &'static str) -> Result<T, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Error + 'static,
    I: Iterator<Item = String>,
{
    Ok(args.next().ok_or(CliErr(missing))?.parse()?)
}
