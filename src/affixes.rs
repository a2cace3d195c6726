// Weekly affix rotation. The rotation is fixed but not exposed by the
// Blizzard API, so the schedule is kept here and indexed by period.

/// Default seasonal affix (Awakened). Overridable via `SEASONAL_AFFIX`
/// since it changes once per season.
pub const DEFAULT_SEASONAL_AFFIX: u32 = 120;

/// The 12-week rotation of the three non-seasonal affixes.
const ROTATION: [[u32; 3]; 12] = [
    [10, 8, 12],
    [9, 5, 3],
    [10, 7, 2],
    [9, 11, 4],
    [10, 8, 14],
    [9, 7, 13],
    [10, 11, 3],
    [9, 6, 4],
    [10, 5, 14],
    [9, 11, 2],
    [10, 7, 12],
    [9, 6, 13],
];

/// Affix ids for a scoring period: the rotation entry at
/// `period % 12` with the seasonal affix appended last.
pub fn affixes_for_period(period: u32, seasonal_affix: u32) -> [u32; 4] {
    let [a, b, c] = ROTATION[(period as usize) % ROTATION.len()];
    [a, b, c, seasonal_affix]
}

/// Local display names for the affix ids appearing in the rotation.
/// The authoritative description comes from the API (`affix_details`);
/// this is only a formatting aid.
pub fn affix_name(id: u32) -> Option<&'static str> {
    Some(match id {
        2 => "Skittish",
        3 => "Volcanic",
        4 => "Necrotic",
        5 => "Teeming",
        6 => "Raging",
        7 => "Bolstering",
        8 => "Sanguine",
        9 => "Tyrannical",
        10 => "Fortified",
        11 => "Bursting",
        12 => "Grievous",
        13 => "Explosive",
        14 => "Quaking",
        120 => "Awakened",
        _ => return None,
    })
}
