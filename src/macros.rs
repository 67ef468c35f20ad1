use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    static ref STDERR_IS_TTY: bool = nix::unistd::isatty(std::io::stderr()).unwrap_or(false);
}

static COLORS_DISABLED: AtomicBool = AtomicBool::new(false);

/// `--no-color`.
pub fn disable_colors() {
    COLORS_DISABLED.store(true, Ordering::Relaxed);
}

pub fn colors_enabled() -> bool {
    *STDERR_IS_TTY && !COLORS_DISABLED.load(Ordering::Relaxed)
}

/// Prints a user-facing error to stderr.
#[macro_export]
macro_rules! print_err {
    ($fmt:expr) => {
        $crate::print_err!($fmt,)
    };
    ($fmt:expr, $($arg:expr),* $(,)?) => {
        if $crate::macros::colors_enabled() {
            eprintln!(concat!("{}{}argform: ", $fmt, "{}"),
                ::crossterm::style::SetAttribute(::crossterm::style::Attribute::Bold),
                ::crossterm::style::SetForegroundColor(::crossterm::style::Color::Yellow),
                $($arg,)*
                ::crossterm::style::SetAttribute(::crossterm::style::Attribute::Reset));
        } else {
            eprintln!(concat!("argform: ", $fmt), $($arg),*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_wins_over_the_terminal() {
        disable_colors();
        assert!(!colors_enabled());
        print_err!("{} and {}", "this", "that");
        print_err!("plain");
    }
}
