use std::fmt::Display;

use console::{Style, StyledObject};

fn paint(text: impl Display, style: Style) -> StyledObject<String> {
    style.apply_to(text.to_string())
}

pub fn bright(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright())
}

pub fn bright_yellow(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright().yellow())
}

pub fn bright_green(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright().green())
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().cyan())
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().dim())
}

pub fn magenta_bold(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().magenta().bold())
}
