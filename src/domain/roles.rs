use rand::seq::SliceRandom;
use rand::Rng;
use crate::error::LobbyError;
use crate::state::lobby::{Player, SpySet};
use crate::utils::worddb::WordDb;

/// Role text delivered to spies instead of the secret word
pub const SPY_ROLE: &str = "Spion";

/// Category name that asks for a random category
pub const RANDOM_CATEGORY: &str = "Zufall";

/// Category requested by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelector {
    Random,
    Named(String),
}

impl CategorySelector {
    pub fn parse(raw: &str) -> Self {
        if raw == RANDOM_CATEGORY {
            CategorySelector::Random
        } else {
            CategorySelector::Named(raw.to_string())
        }
    }
}

impl From<&str> for CategorySelector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Outcome of one role assignment
#[derive(Debug, Clone)]
pub struct RoleAssignment {
    pub category: String,
    pub secret_word: String,
    pub spies: SpySet,
    /// Every player with the role text they receive, in shuffled order
    pub roles: Vec<(Player, String)>,
}

impl RoleAssignment {
    pub fn is_spy(&self, player: &Player) -> bool {
        self.spies.iter().any(|s| s.id == player.id)
    }
}

/// Resolve the effective category and pick the round's secret word
pub fn pick_word<R: Rng + ?Sized>(
    selector: &CategorySelector,
    words: &WordDb,
    rng: &mut R,
) -> Result<(String, String), LobbyError> {
    let category = match selector {
        CategorySelector::Random => words
            .random_category(rng)
            .ok_or_else(|| LobbyError::UnknownCategory(RANDOM_CATEGORY.to_string()))?,
        CategorySelector::Named(name) => words
            .get(name)
            .ok_or_else(|| LobbyError::UnknownCategory(name.clone()))?,
    };

    let word = category
        .random_word(rng)
        .ok_or_else(|| LobbyError::UnknownCategory(category.name.clone()))?;

    Ok((category.name.clone(), word.to_string()))
}

/// Number of spies actually drawn for a requested count
/// Negative requests give no spies, oversized ones make everybody a spy
pub fn effective_spy_count(requested: i64, player_count: usize) -> usize {
    usize::try_from(requested).unwrap_or(0).min(player_count)
}

/// Assign secret roles to `players`
/// The input list is left untouched; a shuffled copy decides the spies
pub fn assign_roles<R: Rng + ?Sized>(
    players: &[Player],
    spy_count: i64,
    selector: &CategorySelector,
    words: &WordDb,
    rng: &mut R,
) -> Result<RoleAssignment, LobbyError> {
    let (category, secret_word) = pick_word(selector, words, rng)?;

    let mut shuffled = players.to_vec();
    shuffled.shuffle(rng);

    let spy_total = effective_spy_count(spy_count, shuffled.len());
    let spies: SpySet = shuffled[..spy_total].iter().cloned().collect();

    let roles = shuffled
        .into_iter()
        .enumerate()
        .map(|(idx, player)| {
            let role = if idx < spy_total {
                SPY_ROLE.to_string()
            } else {
                secret_word.clone()
            };
            (player, role)
        })
        .collect();

    Ok(RoleAssignment {
        category,
        secret_word,
        spies,
        roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::lobby::ConnectionId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn players(names: &[&str]) -> Vec<Player> {
        names.iter().map(|n| Player::new(ConnectionId::new(), *n)).collect()
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(CategorySelector::parse("Zufall"), CategorySelector::Random);
        assert_eq!(
            CategorySelector::parse("Anime"),
            CategorySelector::Named("Anime".to_string())
        );
    }

    #[test]
    fn test_effective_spy_count() {
        assert_eq!(effective_spy_count(1, 3), 1);
        assert_eq!(effective_spy_count(0, 3), 0);
        assert_eq!(effective_spy_count(-2, 3), 0);
        assert_eq!(effective_spy_count(10, 3), 3);
    }

    #[test]
    fn test_exact_spy_count() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(1);
        let list = players(&["Alice", "Bob", "Carol", "Dave", "Eve"]);

        for k in 0..=5 {
            let result = assign_roles(&list, k, &"Anime".into(), &words, &mut rng).unwrap();
            let spy_roles = result.roles.iter().filter(|(_, r)| r == SPY_ROLE).count();
            assert_eq!(spy_roles, k as usize);
            assert_eq!(result.spies.len(), k as usize);

            // every non-spy sees the same word, never the spy text
            for (player, role) in &result.roles {
                if result.is_spy(player) {
                    assert_eq!(role, SPY_ROLE);
                } else {
                    assert_eq!(role, &result.secret_word);
                }
            }
            assert_ne!(result.secret_word, SPY_ROLE);
            assert_eq!(result.category, "Anime");
        }
    }

    #[test]
    fn test_spies_are_distinct_players() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(2);
        let list = players(&["Alice", "Bob", "Carol", "Dave"]);

        let result = assign_roles(&list, 3, &"Geografie".into(), &words, &mut rng).unwrap();
        let mut ids: Vec<_> = result.spies.iter().map(|p| p.id).collect();
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(result.roles.len(), 4);
    }

    #[test]
    fn test_players_input_untouched() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(3);
        let list = players(&["Alice", "Bob", "Carol", "Dave", "Eve", "Frank"]);
        let before = list.clone();

        let _ = assign_roles(&list, 2, &CategorySelector::Random, &words, &mut rng).unwrap();
        assert_eq!(list, before);
    }

    #[test]
    fn test_oversized_and_negative_spy_counts() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(4);
        let list = players(&["Alice", "Bob"]);

        let all = assign_roles(&list, 5, &"Anime".into(), &words, &mut rng).unwrap();
        assert!(all.roles.iter().all(|(_, r)| r == SPY_ROLE));

        let none = assign_roles(&list, -1, &"Anime".into(), &words, &mut rng).unwrap();
        assert!(none.spies.is_empty());
        assert!(none.roles.iter().all(|(_, r)| r == &none.secret_word));
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(5);
        let list = players(&["Alice"]);

        let result = assign_roles(&list, 1, &"Sport".into(), &words, &mut rng);
        assert_eq!(result.unwrap_err(), LobbyError::UnknownCategory("Sport".to_string()));
    }

    #[test]
    fn test_random_category_resolves_to_known_name() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..50 {
            let (category, word) = pick_word(&CategorySelector::Random, &words, &mut rng).unwrap();
            assert!(words.get(&category).unwrap().words.contains(&word));
        }
    }

    #[test]
    fn test_empty_lobby_assignment() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(8);
        let result = assign_roles(&[], 1, &"Anime".into(), &words, &mut rng).unwrap();
        assert!(result.roles.is_empty());
        assert!(result.spies.is_empty());
    }

    #[test]
    fn test_spy_distribution_is_roughly_uniform() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(42);
        let list = players(&["Alice", "Bob", "Carol"]);
        let mut spy_hits: HashMap<String, usize> = HashMap::new();

        for _ in 0..3000 {
            let result = assign_roles(&list, 1, &"Anime".into(), &words, &mut rng).unwrap();
            *spy_hits.entry(result.spies[0].name.clone()).or_default() += 1;
        }

        assert_eq!(spy_hits.len(), 3);
        for (name, hits) in &spy_hits {
            assert!((850..=1150).contains(hits), "{} was spy {} times", name, hits);
        }
    }

    #[test]
    fn test_word_distribution_is_roughly_uniform() {
        let words = WordDb::load();
        let mut rng = StdRng::seed_from_u64(43);
        let mut word_hits: HashMap<String, usize> = HashMap::new();

        for _ in 0..5000 {
            let (_, word) = pick_word(&"Geografie".into(), &words, &mut rng).unwrap();
            *word_hits.entry(word).or_default() += 1;
        }

        assert_eq!(word_hits.len(), 5);
        for (word, hits) in &word_hits {
            assert!((800..=1200).contains(hits), "{} drawn {} times", word, hits);
        }
    }
}
