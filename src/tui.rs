use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::{DefaultTerminal, Frame, Terminal};

use crate::error::Result;
use crate::fmt::money;
use crate::theme::{hex_rgb, Palette};

pub fn color(hex: &str) -> Color {
    match hex_rgb(hex) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

/// Terminal styles derived from a palette.
#[derive(Debug, Clone, Copy)]
pub struct Styles {
    pub base: Style,
    pub header: Style,
    pub footer: Style,
    pub secondary: Color,
    pub grid: Color,
    pub positive: Style,
    pub negative: Style,
    pub selected: Style,
}

impl Styles {
    pub fn from_palette(p: &Palette) -> Self {
        let base = Style::new().fg(color(p.text)).bg(color(p.background));
        Self {
            base,
            header: base.fg(color(p.primary)).add_modifier(Modifier::BOLD),
            footer: base.fg(color(p.grid)),
            secondary: color(p.secondary),
            grid: color(p.grid),
            positive: base.fg(color(p.positive)),
            negative: base.fg(color(p.negative)),
            selected: base.add_modifier(Modifier::BOLD | Modifier::REVERSED),
        }
    }

    /// Amount colored by sign.
    pub fn money_span(&self, amount: f64) -> Span<'static> {
        let style = if amount < 0.0 {
            self.negative
        } else {
            self.positive
        };
        Span::styled(money(amount), style)
    }
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

pub enum ViewAction {
    Continue,
    Close,
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Restores the terminal when dropped, including on early `?` returns.
struct TerminalGuard(DefaultTerminal);

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        ratatui::restore();
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Next key press, or `None` for any other terminal event (resize, focus,
/// key release).
fn next_press() -> Result<Option<KeyEvent>> {
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// Redraw after every event and hand presses to the view until it closes.
/// Ctrl-C always ends the loop.
fn drive<B: Backend>(
    terminal: &mut Terminal<B>,
    view: &mut dyn View,
    mut next_key: impl FnMut() -> Result<Option<KeyEvent>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| view.draw(frame))?;
        let Some(key) = next_key()? else {
            continue;
        };
        if is_interrupt(&key) {
            return Ok(());
        }
        if let ViewAction::Close = view.handle_key(key.code) {
            return Ok(());
        }
    }
}

/// Run an interactive view on the real terminal.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut guard = TerminalGuard(ratatui::init());
    drive(&mut guard.0, view, next_press)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{resolve, Theme};

    #[test]
    fn test_color_from_hex() {
        assert_eq!(color("#ff7f0e"), Color::Rgb(255, 127, 14));
        assert_eq!(color("nope"), Color::Reset);
    }

    #[test]
    fn test_styles_follow_palette() {
        let dark = Styles::from_palette(&resolve(Theme::Dark));
        assert_eq!(dark.base.bg, Some(Color::Rgb(0x11, 0x11, 0x11)));
        let light = Styles::from_palette(&resolve(Theme::Light));
        assert_eq!(light.base.bg, Some(Color::Rgb(0xff, 0xff, 0xff)));
        assert_eq!(light.money_span(-5.0).style, light.negative);
        assert_eq!(light.money_span(5.0).content, "$5");
    }

    /// Counts draws, records keys and closes on `q`.
    #[derive(Default)]
    struct Recorder {
        draws: usize,
        keys: Vec<KeyCode>,
    }

    impl View for Recorder {
        fn draw(&mut self, _frame: &mut Frame) {
            self.draws += 1;
        }

        fn handle_key(&mut self, code: KeyCode) -> ViewAction {
            self.keys.push(code);
            match code {
                KeyCode::Char('q') => ViewAction::Close,
                _ => ViewAction::Continue,
            }
        }
    }

    fn scripted(keys: Vec<Option<KeyEvent>>) -> impl FnMut() -> Result<Option<KeyEvent>> {
        let mut keys = keys.into_iter();
        move || Ok(keys.next().expect("script exhausted"))
    }

    fn press(code: KeyCode) -> Option<KeyEvent> {
        Some(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_drive_redraws_until_close() {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(20, 5)).unwrap();
        let mut view = Recorder::default();
        let script = vec![press(KeyCode::Left), None, press(KeyCode::Char('q'))];
        drive(&mut terminal, &mut view, scripted(script)).unwrap();
        assert_eq!(view.draws, 3);
        assert_eq!(view.keys, vec![KeyCode::Left, KeyCode::Char('q')]);
    }

    #[test]
    fn test_drive_stops_on_ctrl_c() {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(20, 5)).unwrap();
        let mut view = Recorder::default();
        let ctrl_c = Some(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        drive(&mut terminal, &mut view, scripted(vec![ctrl_c])).unwrap();
        assert_eq!(view.draws, 1);
        assert!(view.keys.is_empty());
    }

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("one two three four", 9);
        assert_eq!(lines, 3);
        assert!(wrapped.contains('\n'));
        assert_eq!(wrap_text("x", 0).1, 1);
    }
}
