/// Outcome of one rewrite call.
///
/// A failed call carries only its reason, so token and cost figures are zero
/// for it by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteResult {
    Completed {
        raw_text: String,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
    },
    Failed {
        reason: String,
    },
}

impl RewriteResult {
    pub fn input_tokens(&self) -> u64 {
        match self {
            RewriteResult::Completed { input_tokens, .. } => *input_tokens,
            RewriteResult::Failed { .. } => 0,
        }
    }

    pub fn output_tokens(&self) -> u64 {
        match self {
            RewriteResult::Completed { output_tokens, .. } => *output_tokens,
            RewriteResult::Failed { .. } => 0,
        }
    }

    pub fn cost(&self) -> f64 {
        match self {
            RewriteResult::Completed { cost, .. } => *cost,
            RewriteResult::Failed { .. } => 0.0,
        }
    }

    #[cfg(test)]
    pub fn is_failed(&self) -> bool {
        matches!(self, RewriteResult::Failed { .. })
    }
}

/// Title, summary and body decoded from a model reply. All empty when the
/// reply could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRewrite {
    pub title: String,
    pub summary: String,
    pub rewritten_article: String,
}
