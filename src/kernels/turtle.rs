//! Turtle Walk Engine
//!
//! Interprets a symbol string as pen commands and collects the drawn
//! segments plus their running bounding box.
//! - draw symbols (per preset, usually `F`): advance and draw
//! - `f`: advance without drawing
//! - `+` / `-`: turn by the configured angle
//! - `[` / `]`: push / pop the full turtle state

use serde::Serialize;

use super::geometry::{BoundingBox, Point2, Segment};

#[derive(Debug, Clone, PartialEq)]
pub struct TurtleConfig {
    /// Turn angle in radians
    pub angle: f64,
    /// Distance advanced per move
    pub step: f64,
    /// Initial heading in radians
    pub heading: f64,
    pub draw_symbols: String,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            angle: std::f64::consts::FRAC_PI_2,
            step: 1.0,
            heading: 0.0,
            draw_symbols: "F".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: Point2,
    pub heading: f64,
}

/// Segments plus the extent they cover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurtlePath {
    pub segments: Vec<Segment>,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone)]
pub struct Turtle {
    state: TurtleState,
    stack: Vec<TurtleState>,
}

impl Turtle {
    pub fn new(heading: f64) -> Self {
        Self {
            state: TurtleState { position: Point2::ORIGIN, heading },
            stack: Vec::new(),
        }
    }

    pub fn state(&self) -> TurtleState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn advance(&mut self, step: f64) -> Segment {
        let start = self.state.position;
        let end = Point2::new(
            start.x + self.state.heading.cos() * step,
            start.y + self.state.heading.sin() * step,
        );
        self.state.position = end;
        Segment { start, end }
    }

    /// Execute one symbol. Returns the segment if the symbol drew one.
    ///
    /// `]` on an empty stack is a no-op.
    pub fn execute(&mut self, symbol: char, config: &TurtleConfig) -> Option<Segment> {
        match symbol {
            '+' => self.state.heading += config.angle,
            '-' => self.state.heading -= config.angle,
            '[' => self.stack.push(self.state),
            ']' => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            'f' => {
                self.advance(config.step);
            }
            c if config.draw_symbols.contains(c) => return Some(self.advance(config.step)),
            _ => {}
        }
        None
    }
}

/// Walk a symbol string left to right
pub fn interpret(symbols: &str, config: &TurtleConfig) -> TurtlePath {
    let mut turtle = Turtle::new(config.heading);
    let mut bounds = BoundingBox::at(Point2::ORIGIN);
    let mut segments = Vec::new();

    for symbol in symbols.chars() {
        let before = turtle.state().position;
        if let Some(segment) = turtle.execute(symbol, config) {
            bounds.include(segment.end);
            segments.push(segment);
        } else if turtle.state().position != before {
            bounds.include(turtle.state().position);
        }
    }

    tracing::debug!(segments = segments.len(), "turtle walk complete");
    TurtlePath { segments, bounds }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_config() -> TurtleConfig {
        TurtleConfig::default()
    }

    #[test]
    fn test_three_forward_moves() {
        let path = interpret("FFF", &square_config());
        assert_eq!(path.segments.len(), 3);
        assert!(path.segments.iter().all(|s| (s.length() - 1.0).abs() < 1e-12));
        assert!((path.segments[2].end.x - 3.0).abs() < 1e-12);
        assert!((path.bounds.width() - 3.0).abs() < 1e-12);
        assert_eq!(path.bounds.height(), 0.0);
    }

    #[test]
    fn test_push_pop_round_trip() {
        let config = TurtleConfig { angle: 0.3, ..square_config() };
        for inner in ["", "F", "+F-FF", "F[+F]F--F", "++++"] {
            let mut turtle = Turtle::new(0.7);
            for c in "F+F".chars() {
                turtle.execute(c, &config);
            }
            let before = turtle.state();
            turtle.execute('[', &config);
            for c in inner.chars() {
                turtle.execute(c, &config);
            }
            turtle.execute(']', &config);
            assert_eq!(turtle.state(), before, "bracket contents: {inner:?}");
            assert_eq!(turtle.depth(), 0);
        }
    }

    #[test]
    fn test_pop_on_empty_stack_is_noop() {
        let config = square_config();
        let mut turtle = Turtle::new(0.0);
        turtle.execute('F', &config);
        let before = turtle.state();
        assert!(turtle.execute(']', &config).is_none());
        assert_eq!(turtle.state(), before);
    }

    #[test]
    fn test_move_without_drawing() {
        let path = interpret("fF", &square_config());
        assert_eq!(path.segments.len(), 1);
        assert!((path.segments[0].start.x - 1.0).abs() < 1e-12);
        assert!((path.bounds.max_x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_string_degenerate_bounds() {
        let path = interpret("", &square_config());
        assert!(path.segments.is_empty());
        assert_eq!(path.bounds.width(), 0.0);
        assert_eq!(path.bounds.height(), 0.0);
    }

    #[test]
    fn test_square_closes() {
        let path = interpret("F+F+F+F", &square_config());
        let last = path.segments.last().map(|s| s.end).unwrap_or_default();
        assert!(last.x.abs() < 1e-9 && last.y.abs() < 1e-9);
    }
}
