use std::io::{self, BufRead, IsTerminal};

use dialoguer::Input;
use readdon_core::ports::UrlPrompt;
use readdon_core::use_cases::DONE_SENTINEL;
use readdon_core::Error;

pub const URL_EXAMPLE: &str =
    "https://torrentio.strem.fun/qualityfilter=480p,unknown%7Climit=2/manifest.json";

/// Prompt for addon URLs during cache bootstrap.
///
/// Interactive terminals get a dialoguer input; piped or redirected stdin is
/// read line by line.
pub struct DialoguerUrlPrompt {
    label: String,
    interactive: bool,
}

impl DialoguerUrlPrompt {
    pub fn new() -> Self {
        Self {
            label: format!("Paste addon URL (or type '{}' to finish)", DONE_SENTINEL),
            interactive: io::stdin().is_terminal(),
        }
    }
}

/// One line from `reader` without its line ending, `None` at end of input.
fn read_url_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, Error> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| Error::Prompt(format!("failed to read addon URL: {}", e)))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Closed stdin ends the URL list instead of failing the run.
fn is_end_of_input(err: &dialoguer::Error) -> bool {
    match err {
        dialoguer::Error::IO(e) => e.kind() == io::ErrorKind::UnexpectedEof,
    }
}

impl UrlPrompt for DialoguerUrlPrompt {
    fn next_url(&mut self) -> Result<Option<String>, Error> {
        if !self.interactive {
            println!("{}:", self.label);
            return read_url_line(&mut io::stdin().lock());
        }

        match Input::<String>::new()
            .with_prompt(&self.label)
            .allow_empty(true)
            .interact_text()
        {
            Ok(url) => Ok(Some(url)),
            Err(e) if is_end_of_input(&e) => Ok(None),
            Err(e) => Err(Error::Prompt(format!("failed to read addon URL: {}", e))),
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
        if message.starts_with("No custom addons found") {
            println!("Example Input: {}", URL_EXAMPLE);
        }
    }
}
