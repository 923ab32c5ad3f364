//! Affection meter: label, tier-colored bar and floating delta markers

use greengarden_core::view::{IndicatorView, MeterView};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Rows the meter needs, borders included.
pub const METER_HEIGHT: u16 = 5;

pub struct AffectionMeterWidget<'a> {
    meter: &'a MeterView<'a>,
    indicators: &'a [IndicatorView],
    theme: &'a Theme,
}

impl<'a> AffectionMeterWidget<'a> {
    pub fn new(meter: &'a MeterView<'a>, indicators: &'a [IndicatorView], theme: &'a Theme) -> Self {
        Self {
            meter,
            indicators,
            theme,
        }
    }

    /// Markers start on the label row and float up one row halfway through.
    fn render_indicators(&self, label_row: Rect, upper_row: Rect, buf: &mut Buffer) {
        let mut right = label_row.x + label_row.width;
        for indicator in self.indicators.iter().rev() {
            let width = indicator.text.chars().count() as u16 + 1;
            if right < label_row.x + width {
                break;
            }
            right -= width;

            let y = if indicator.progress < 0.5 {
                label_row.y
            } else {
                upper_row.y
            };
            let style = self.theme.faded(
                Style::default()
                    .fg(self.theme.sentiment_color(indicator.sentiment))
                    .add_modifier(Modifier::BOLD),
                indicator.opacity,
            );
            buf.set_string(right, y, &indicator.text, style);
        }
    }
}

impl Widget for AffectionMeterWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Affection ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // relationship
                Constraint::Length(1), // label
                Constraint::Length(1), // bar
                Constraint::Min(0),
            ])
            .split(inner);

        let color = self.theme.tier_color(self.meter.tier);

        Paragraph::new(Line::from(Span::styled(
            self.meter.relationship,
            Style::default().add_modifier(Modifier::ITALIC),
        )))
        .render(rows[0], buf);

        Paragraph::new(Line::from(vec![
            Span::raw("Closeness "),
            Span::styled(
                self.meter.label.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .render(rows[1], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio((self.meter.bar_width / 100.0).clamp(0.0, 1.0))
            .label("")
            .use_unicode(true)
            .render(rows[2], buf);

        self.render_indicators(rows[1], rows[0], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greengarden_core::{Sentiment, Tier};
    use ratatui::{backend::TestBackend, style::Color, Terminal};

    fn meter(label: i32, tier: Tier) -> MeterView<'static> {
        MeterView {
            label,
            bar_width: label as f64,
            tier,
            relationship: "Acquaintance",
            scene: "Bakery Club booth",
        }
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn test_label_and_bar_use_tier_color() {
        let theme = Theme::default();
        let view = meter(45, Tier::Warning);
        let mut terminal = Terminal::new(TestBackend::new(30, METER_HEIGHT)).unwrap();
        terminal
            .draw(|f| f.render_widget(AffectionMeterWidget::new(&view, &[], &theme), f.area()))
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        assert!(row(&buffer, 1).contains("Acquaintance"));
        assert!(row(&buffer, 2).contains("Closeness 45"));

        let label_x = 1 + "Closeness ".len() as u16;
        assert_eq!(buffer[(label_x, 2)].fg, Color::Yellow);
        // Bar starts at the left edge of the inner area.
        assert_eq!(buffer[(1, 3)].fg, Color::Yellow);
    }

    #[test]
    fn test_indicator_rises() {
        let theme = Theme::default();
        let view = meter(20, Tier::Danger);
        let mut indicator = IndicatorView {
            text: "-10".to_string(),
            sentiment: Sentiment::Danger,
            progress: 0.1,
            opacity: 0.9,
        };

        let mut terminal = Terminal::new(TestBackend::new(30, METER_HEIGHT)).unwrap();
        let indicators = vec![indicator.clone()];
        terminal
            .draw(|f| {
                f.render_widget(
                    AffectionMeterWidget::new(&view, &indicators, &theme),
                    f.area(),
                )
            })
            .unwrap();
        assert!(row(terminal.backend().buffer(), 2).contains("-10"));

        indicator.progress = 0.8;
        indicator.opacity = 0.2;
        let indicators = vec![indicator];
        terminal
            .draw(|f| {
                f.render_widget(
                    AffectionMeterWidget::new(&view, &indicators, &theme),
                    f.area(),
                )
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        assert!(row(buffer, 1).contains("-10"));
        assert!(!row(buffer, 2).contains("-10"));
    }
}
