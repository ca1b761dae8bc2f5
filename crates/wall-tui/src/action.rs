//! Action enum: everything the user can ask the app to do.

use wall_proto::protocol::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Forward a command to the wall core.
    Send(Command),
    /// Move the tile selection by columns / rows on the grid.
    Move { dx: i32, dy: i32 },
    SelectNext,
    SelectPrev,
    /// Point the selection at a tile (mouse clicks).
    Select(usize),
    /// Open the source editor on the selected tile.
    EditSource,
    /// Store the edited source for a tile.
    CommitSource { tile: usize, reference: String },
    CancelEdit,
    /// Copy the selected tile's watch URL.
    CopyWatchUrl,
    ToggleHelp,
    Quit,
}
