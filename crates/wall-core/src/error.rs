use thiserror::Error;

/// Per-tile failures.  None of these stop the wall; they are reported to the
/// user and the tile keeps its previous state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallError {
    #[error("tile {}: source is not a recognizable video link or id", .tile + 1)]
    Unparseable { tile: usize },
    #[error("there is no tile {}", .0 + 1)]
    NoSuchTile(usize),
}

impl WallError {
    pub fn tile(&self) -> usize {
        match self {
            WallError::Unparseable { tile } => *tile,
            WallError::NoSuchTile(tile) => *tile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_one_based_tiles() {
        assert_eq!(
            WallError::Unparseable { tile: 2 }.to_string(),
            "tile 3: source is not a recognizable video link or id"
        );
        assert_eq!(WallError::NoSuchTile(6).to_string(), "there is no tile 7");
        assert_eq!(WallError::NoSuchTile(6).tile(), 6);
    }
}
