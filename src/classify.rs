/// Combined expected contribution above which an attacking return is treated
/// as more likely than not. The clean-sheet summary reuses it for the
/// opponent's xG.
pub const RETURN_THRESHOLD: f64 = 0.7;

pub const LIKELY_RETURN_LABEL: &str = "likelyReturn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnLabel {
    LikelyReturn,
    #[default]
    Blank,
}

impl ReturnLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnLabel::LikelyReturn => LIKELY_RETURN_LABEL,
            ReturnLabel::Blank => "",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim() == LIKELY_RETURN_LABEL {
            ReturnLabel::LikelyReturn
        } else {
            ReturnLabel::Blank
        }
    }
}

pub fn classify(xg: f64, xag: f64) -> ReturnLabel {
    if xg + xag > RETURN_THRESHOLD {
        ReturnLabel::LikelyReturn
    } else {
        ReturnLabel::Blank
    }
}

/// A side is expected to keep a clean sheet when its opponent's xG is at or
/// below the threshold.
pub fn clean_sheet_likely(opponent_xg: f64) -> bool {
    opponent_xg <= RETURN_THRESHOLD
}
