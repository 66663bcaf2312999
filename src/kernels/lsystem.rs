//! L-System grammars - deterministic string rewriting
//!
//! A grammar is an axiom plus single-symbol production rules. Each
//! generation replaces every symbol that has a rule; the rest pass
//! through unchanged. Output length grows exponentially with the
//! iteration count, so callers must keep it small.

use std::collections::HashMap;

use super::turtle::TurtleConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    axiom: String,
    rules: HashMap<char, String>,
}

impl Grammar {
    pub fn new(axiom: impl Into<String>) -> Self {
        Self { axiom: axiom.into(), rules: HashMap::new() }
    }

    pub fn with_rule(mut self, symbol: char, replacement: impl Into<String>) -> Self {
        self.rules.insert(symbol, replacement.into());
        self
    }

    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    /// Apply `iterations` substitution passes to the axiom
    pub fn expand(&self, iterations: u32) -> String {
        let growth = self.rules.values().map(|r| r.chars().count()).max().unwrap_or(1).max(1);
        let mut s = self.axiom.clone();

        for _ in 0..iterations {
            let mut next = String::with_capacity(s.len().saturating_mul(growth));
            for c in s.chars() {
                match self.rules.get(&c) {
                    Some(replacement) => next.push_str(replacement),
                    None => next.push(c),
                }
            }
            s = next;
        }

        tracing::debug!(iterations, len = s.len(), "expanded grammar");
        s
    }
}

/// Named grammars from the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LSystemPreset {
    /// Axiom: F++F++F, Rules: F → F-F++F-F, Angle: 60°
    Koch,
    /// Axiom: FX, Rules: X → X+YF+, Y → -FX-Y, Angle: 90°
    Dragon,
    /// Axiom: F, Rules: F → FF+[+F-F-F]-[-F+F+F]
    Tree,
    /// Axiom: X, Rules: F → FF, X → F+[[X]-X]-F[-FX]+X
    WindyPlant,
    /// Axiom: F, Rules: F → G-F-G, G → F+G+F, Angle: 60°
    SierpinskiArrowhead,
    /// Axiom: A, Rules: A → -BF+AFA+FB-, B → +AF-BFB-FA+, Angle: 90°
    Hilbert,
    /// Axiom: F, Rules: F → F+F-F-F-F+F+F+F-F, Angle: 90°
    Peano,
    /// Axiom: A, Rules: A → A-B--B+A++AA+B-, B → +A-BB--B-A++A+B, Angle: 60°
    Gosper,
}

impl LSystemPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "koch" => Some(Self::Koch),
            "dragon" => Some(Self::Dragon),
            "tree" => Some(Self::Tree),
            "windy" => Some(Self::WindyPlant),
            "sierpinski" => Some(Self::SierpinskiArrowhead),
            "hilbert" => Some(Self::Hilbert),
            "peano" => Some(Self::Peano),
            "gosper" => Some(Self::Gosper),
            _ => None,
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Self::Koch => Grammar::new("F++F++F").with_rule('F', "F-F++F-F"),
            Self::Dragon => Grammar::new("FX").with_rule('X', "X+YF+").with_rule('Y', "-FX-Y"),
            Self::Tree => Grammar::new("F").with_rule('F', "FF+[+F-F-F]-[-F+F+F]"),
            Self::WindyPlant => Grammar::new("X")
                .with_rule('F', "FF")
                .with_rule('X', "F+[[X]-X]-F[-FX]+X"),
            Self::SierpinskiArrowhead => Grammar::new("F").with_rule('F', "G-F-G").with_rule('G', "F+G+F"),
            Self::Hilbert => Grammar::new("A")
                .with_rule('A', "-BF+AFA+FB-")
                .with_rule('B', "+AF-BFB-FA+"),
            Self::Peano => Grammar::new("F").with_rule('F', "F+F-F-F-F+F+F+F-F"),
            Self::Gosper => Grammar::new("A")
                .with_rule('A', "A-B--B+A++AA+B-")
                .with_rule('B', "+A-BB--B-A++A+B"),
        }
    }

    /// Turn angle used when the caller does not supply one
    pub fn default_angle_degrees(&self) -> f64 {
        match self {
            Self::Koch | Self::SierpinskiArrowhead | Self::Gosper => 60.0,
            Self::Dragon | Self::Hilbert | Self::Peano => 90.0,
            Self::Tree | Self::WindyPlant => 25.0,
        }
    }

    pub fn default_iterations(&self) -> u32 {
        match self {
            Self::Koch => 4,
            Self::Dragon => 10,
            Self::Tree => 4,
            Self::WindyPlant => 5,
            Self::SierpinskiArrowhead => 6,
            Self::Hilbert => 5,
            Self::Peano => 3,
            Self::Gosper => 4,
        }
    }

    /// Symbols that advance the pen and draw
    pub fn draw_symbols(&self) -> &'static str {
        match self {
            Self::SierpinskiArrowhead => "FG",
            Self::Gosper => "AB",
            _ => "F",
        }
    }

    /// Starting heading in degrees (0 = +x, y grows downwards on screen)
    pub fn initial_heading_degrees(&self) -> f64 {
        match self {
            Self::Tree => -90.0,
            Self::WindyPlant => -100.0,
            _ => 0.0,
        }
    }

    pub fn turtle_config(&self, angle_degrees: f64) -> TurtleConfig {
        TurtleConfig {
            angle: angle_degrees.to_radians(),
            step: 1.0,
            heading: self.initial_heading_degrees().to_radians(),
            draw_symbols: self.draw_symbols().to_string(),
        }
    }
}
