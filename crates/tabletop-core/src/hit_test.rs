//! Resolving map coordinates to tokens.

use crate::grid::{GridSettings, effective_token_diameter};
use crate::token::{Token, TokenId};
use kurbo::Point;

/// Check whether `point` lies on the token's disc (boundary inclusive).
pub fn token_contains(token: &Token, point: Point, grid: &GridSettings) -> bool {
    let radius = effective_token_diameter(token, grid) / 2.0;
    token.position.distance(point) <= radius
}

/// Find the topmost token under `point`.
///
/// Tokens are drawn in array order, so the last matching token wins.
pub fn hit_test<'a>(point: Point, tokens: &'a [Token], grid: &GridSettings) -> Option<&'a Token> {
    tokens
        .iter()
        .rev()
        .find(|token| token_contains(token, point, grid))
}

/// All tokens under `point`, front to back.
pub fn tokens_at_point(point: Point, tokens: &[Token], grid: &GridSettings) -> Vec<TokenId> {
    tokens
        .iter()
        .rev()
        .filter(|token| token_contains(token, point, grid))
        .map(Token::id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenSize;

    #[test]
    fn test_topmost_wins() {
        let grid = GridSettings::default();
        let a = Token::new(Point::new(100.0, 100.0));
        let b = Token::new(Point::new(110.0, 100.0));
        let (id_a, id_b) = (a.id(), b.id());
        let tokens = vec![a, b];

        let hit = hit_test(Point::new(105.0, 100.0), &tokens, &grid).unwrap();
        assert_eq!(hit.id(), id_b);

        let all = tokens_at_point(Point::new(105.0, 100.0), &tokens, &grid);
        assert_eq!(all, vec![id_b, id_a]);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let grid = GridSettings::default();
        // Medium token on a 50px grid has radius 25
        let tokens = vec![Token::new(Point::new(100.0, 100.0))];

        assert!(hit_test(Point::new(125.0, 100.0), &tokens, &grid).is_some());
        assert!(hit_test(Point::new(100.0, 75.0), &tokens, &grid).is_some());
        assert!(hit_test(Point::new(125.0 + 1e-9, 100.0), &tokens, &grid).is_none());
    }

    #[test]
    fn test_miss_returns_none() {
        let grid = GridSettings::default();
        let tokens = vec![Token::new(Point::new(100.0, 100.0))];
        assert!(hit_test(Point::new(300.0, 300.0), &tokens, &grid).is_none());
        assert!(hit_test(Point::new(0.0, 0.0), &[], &grid).is_none());
    }

    #[test]
    fn test_size_affects_reach() {
        let grid = GridSettings::default();
        let tokens = vec![Token::new(Point::new(100.0, 100.0)).with_size(TokenSize::Huge)];
        // Huge token spans three cells, radius 75
        assert!(hit_test(Point::new(170.0, 100.0), &tokens, &grid).is_some());
        assert!(hit_test(Point::new(176.0, 100.0), &tokens, &grid).is_none());
    }
}
