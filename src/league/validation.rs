use crate::league::error::LeagueError;
use crate::models::league::{CreateLeagueRequest, LeagueFormat, ScoringRules};

pub const MAX_PARTICIPANTS: usize = 20;
pub const INVITE_CODE_LENGTH: usize = 6;
const MAX_LEAGUE_NAME: usize = 100;
const MAX_TEAM_NAME: usize = 50;
const MAX_SCORING_WEIGHT: i32 = 100;
const MAX_REASONABLE_SCORE: i32 = 99;

/// Centralized validation service for league operations
pub struct LeagueValidator;

impl LeagueValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a league creation request, returning the parsed pieces
    pub fn validate_create_league_request(
        &self,
        request: &CreateLeagueRequest,
    ) -> Result<(String, LeagueFormat, ScoringRules, String), LeagueError> {
        let name = self.validate_league_name(&request.name)?;
        let format = request.format.trim().to_lowercase().parse::<LeagueFormat>()?;

        let defaults = ScoringRules::default();
        let scoring = ScoringRules {
            win_points: request.win_points.unwrap_or(defaults.win_points),
            draw_points: request.draw_points.unwrap_or(defaults.draw_points),
            loss_points: request.loss_points.unwrap_or(defaults.loss_points),
        };
        self.validate_scoring(&scoring)?;

        let team_name = self.validate_and_sanitize_team_name(&request.team_name)?;

        Ok((name, format, scoring, team_name))
    }

    pub fn validate_league_name(&self, name: &str) -> Result<String, LeagueError> {
        let sanitized = self.sanitize_string_input(name);

        if sanitized.is_empty() {
            return Err(LeagueError::Validation("League name cannot be empty".into()));
        }

        if sanitized.chars().count() > MAX_LEAGUE_NAME {
            return Err(LeagueError::Validation(format!(
                "League name too long (maximum {} characters)",
                MAX_LEAGUE_NAME
            )));
        }

        if !sanitized.chars().any(|c| c.is_alphanumeric()) {
            return Err(LeagueError::Validation("League name must contain alphanumeric characters".into()));
        }

        Ok(sanitized)
    }

    pub fn validate_scoring(&self, scoring: &ScoringRules) -> Result<(), LeagueError> {
        for (label, value) in [
            ("Win", scoring.win_points),
            ("Draw", scoring.draw_points),
            ("Loss", scoring.loss_points),
        ] {
            if !(0..=MAX_SCORING_WEIGHT).contains(&value) {
                return Err(LeagueError::Validation(format!(
                    "{} points must be between 0 and {}, got {}",
                    label, MAX_SCORING_WEIGHT, value
                )));
            }
        }
        Ok(())
    }

    /// Validate match scores
    pub fn validate_scores(&self, home_score: i32, away_score: i32) -> Result<(), LeagueError> {
        if home_score < 0 || away_score < 0 {
            return Err(LeagueError::Validation(format!(
                "Scores cannot be negative: {} - {}",
                home_score, away_score
            )));
        }

        if home_score > MAX_REASONABLE_SCORE || away_score > MAX_REASONABLE_SCORE {
            return Err(LeagueError::Validation(format!(
                "Score too high: {} - {} (max {})",
                home_score, away_score, MAX_REASONABLE_SCORE
            )));
        }

        Ok(())
    }

    /// Normalise an invite code as typed by a user
    pub fn normalize_invite_code(&self, code: &str) -> Result<String, LeagueError> {
        let code = code.trim().to_uppercase();
        if code.len() != INVITE_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LeagueError::Validation(format!(
                "Invite code must be {} letters or digits",
                INVITE_CODE_LENGTH
            )));
        }
        Ok(code)
    }

    pub fn validate_participant_count(&self, current: usize) -> Result<(), LeagueError> {
        if current >= MAX_PARTICIPANTS {
            return Err(LeagueError::Validation(format!(
                "League is full (maximum {} participants)",
                MAX_PARTICIPANTS
            )));
        }
        Ok(())
    }

    /// Comprehensive input sanitization
    pub fn sanitize_string_input(&self, input: &str) -> String {
        input
            .trim()
            .chars()
            .filter(|&c| c != '\0')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate and sanitize team name
    pub fn validate_and_sanitize_team_name(&self, name: &str) -> Result<String, LeagueError> {
        let sanitized = self.sanitize_string_input(name);

        if sanitized.is_empty() {
            return Err(LeagueError::Validation("Team name cannot be empty".into()));
        }

        if sanitized.chars().count() > MAX_TEAM_NAME {
            return Err(LeagueError::Validation(format!(
                "Team name too long (max {} characters)",
                MAX_TEAM_NAME
            )));
        }

        Ok(sanitized)
    }
}

impl Default for LeagueValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: &str) -> CreateLeagueRequest {
        CreateLeagueRequest {
            name: "  Sunday League  ".into(),
            format: format.into(),
            win_points: None,
            draw_points: Some(2),
            loss_points: None,
            team_name: "Galacticos\0".into(),
            team_id: None,
        }
    }

    #[test]
    fn test_create_request_is_parsed_and_sanitized() {
        let validator = LeagueValidator::new();
        let (name, format, scoring, team) = validator.validate_create_league_request(&request("Double")).unwrap();
        assert_eq!(name, "Sunday League");
        assert_eq!(format, LeagueFormat::Double);
        assert_eq!(scoring, ScoringRules { win_points: 3, draw_points: 2, loss_points: 0 });
        assert_eq!(team, "Galacticos");
    }

    #[test]
    fn test_unknown_format_is_rejected_not_defaulted() {
        let validator = LeagueValidator::new();
        let result = validator.validate_create_league_request(&request("groups"));
        assert!(matches!(result, Err(LeagueError::InvalidFormat(_))));
    }

    #[test]
    fn test_scoring_bounds() {
        let validator = LeagueValidator::new();
        assert!(validator.validate_scoring(&ScoringRules { win_points: -1, draw_points: 0, loss_points: 0 }).is_err());
        assert!(validator.validate_scoring(&ScoringRules { win_points: 101, draw_points: 0, loss_points: 0 }).is_err());
        assert!(validator.validate_scoring(&ScoringRules::default()).is_ok());
    }

    #[test]
    fn test_scores_and_invite_codes() {
        let validator = LeagueValidator::new();
        assert!(validator.validate_scores(0, 99).is_ok());
        assert!(validator.validate_scores(-1, 0).is_err());
        assert!(validator.validate_scores(3, 100).is_err());

        assert_eq!(validator.normalize_invite_code(" ab12cd ").unwrap(), "AB12CD");
        assert!(validator.normalize_invite_code("AB1").is_err());
        assert!(validator.normalize_invite_code("AB-12C").is_err());
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let validator = LeagueValidator::new();
        assert!(validator.validate_league_name("   ").is_err());
        assert!(validator.validate_league_name("!!!").is_err());
        assert!(validator.validate_and_sanitize_team_name(" \0 ").is_err());
        assert!(validator.validate_and_sanitize_team_name(&"x".repeat(51)).is_err());
    }
}
