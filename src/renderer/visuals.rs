//! Image manifest: which file backs each [`VisualId`]

use crate::sim::VisualId;

/// Every image the game draws, relative to the page root
pub const MANIFEST: &[(VisualId, &str)] = &[
    (VisualId(1), "images/standing_still.png"),
    (VisualId(2), "images/run1.png"),
    (VisualId(3), "images/run2.png"),
    (VisualId(5), "images/ground.png"),
    (VisualId(10), "images/cactus_1.png"),
    (VisualId(11), "images/cactus_2.png"),
    (VisualId(12), "images/cactus_3.png"),
    (VisualId(101), "images/items/pokeball_red.png"),
    (VisualId(102), "images/items/pokeball_yellow.png"),
    (VisualId(103), "images/items/pokeball_purple.png"),
    (VisualId(104), "images/items/pokeball_cyan.png"),
    (VisualId(105), "images/items/pokeball_orange.png"),
    (VisualId(106), "images/items/pokeball_lemon.png"),
    (VisualId(107), "images/items/pokeball_green.png"),
    (VisualId(108), "images/items/pokeball_dream.png"),
    (VisualId(109), "images/items/pokeball_pink.png"),
    (VisualId(110), "images/items/pokeball_dive.png"),
    (VisualId(111), "images/items/pokeball_dounut.png"),
    (VisualId(112), "images/items/pokeball_christmas.png"),
    (VisualId(113), "images/items/pokeball_sky.png"),
    (VisualId(114), "images/items/pokeball_cherish.png"),
    (VisualId(115), "images/items/pokeball_beast.png"),
];

pub fn path_for(visual: VisualId) -> Option<&'static str> {
    MANIFEST
        .iter()
        .find(|(id, _)| *id == visual)
        .map(|(_, path)| *path)
}
