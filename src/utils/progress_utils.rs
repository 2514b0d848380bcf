use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar on stderr, or None when stderr is not a terminal.
pub fn progress_bar(len: u64, msg: String) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let bar = ProgressBar::new(len).with_message(msg);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }

    Some(bar)
}
