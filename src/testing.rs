//! Testing utilities.
//!
//! `MockOracle` answers with scripted responses so the whole
//! interpret-and-resolve pipeline can run deterministically without a
//! model behind it.

use crate::oracle::{GenerateRequest, Oracle, OracleError};
use crate::world::{Entity, GameContext};

/// An oracle that returns scripted responses in order.
pub struct MockOracle {
    responses: Vec<String>,
    response_index: usize,
    /// Requests seen so far, for asserting on prompt contents.
    pub requests: Vec<GenerateRequest>,
}

impl MockOracle {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            response_index: 0,
            requests: Vec::new(),
        }
    }

    /// Add a response to the queue.
    pub fn queue_response(&mut self, response: impl Into<String>) {
        self.responses.push(response.into());
    }

    /// Replay from the first scripted response.
    pub fn reset(&mut self) {
        self.response_index = 0;
    }
}

impl Oracle for MockOracle {
    fn generate(&mut self, request: &GenerateRequest) -> Result<String, OracleError> {
        self.requests.push(request.clone());
        let Some(response) = self.responses.get(self.response_index) else {
            return Err(OracleError("no more scripted responses".to_string()));
        };
        self.response_index += 1;
        Ok(response.clone())
    }
}

/// A small cellar scene: one player, one goblin, one sword.
pub fn sample_context() -> GameContext {
    GameContext {
        location: "a torch-lit cellar beneath the inn".to_string(),
        player: Entity::new("player", "Thorin")
            .with_attribute("hp", 17)
            .with_attribute("max_hp", 20)
            .with_attribute("ac", 16),
        entities: vec![Entity::new("goblin_1", "Goblin Scout")
            .with_attribute("hp", 12)
            .with_attribute("max_hp", 12)
            .with_attribute("ac", 13)],
        equipment: vec!["longsword".to_string(), "shield".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::GmConfig;

    fn request() -> GenerateRequest {
        GenerateRequest {
            prompt: "roll for initiative".to_string(),
            system_prompt: None,
            model: None,
            max_tokens: GmConfig::default().max_tokens,
            temperature: GmConfig::default().temperature,
        }
    }

    #[test]
    fn scripted_responses_come_back_in_order() {
        let mut oracle = MockOracle::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(oracle.generate(&request()).unwrap(), "one");
        assert_eq!(oracle.generate(&request()).unwrap(), "two");
        assert!(oracle.generate(&request()).is_err());
    }

    #[test]
    fn reset_replays_from_the_start() {
        let mut oracle = MockOracle::new(vec!["one".to_string()]);
        let _ = oracle.generate(&request());
        oracle.reset();
        assert_eq!(oracle.generate(&request()).unwrap(), "one");
    }

    #[test]
    fn requests_are_recorded() {
        let mut oracle = MockOracle::new(vec!["one".to_string()]);
        let _ = oracle.generate(&request());
        assert_eq!(oracle.requests.len(), 1);
        assert_eq!(oracle.requests[0].prompt, "roll for initiative");
    }
}
