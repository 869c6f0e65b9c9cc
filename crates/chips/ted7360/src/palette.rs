//! TED color table.
//!
//! A TED color byte carries the base color in bits 0-3 and the
//! luminance in bits 4-6, for 128 colors. Unlike the TIA there is no
//! decode matrix: the RGB values below were digitized from a real
//! machine's TV output, base colors black, white, red, cyan, purple,
//! green, blue, yellow, orange, light orange, pink, light cyan, light
//! violet, light green, light blue, light yellow, each at 8 luminances.

pub const PALETTE: [u32; 128] = [
    // luminance 0
    0x060103, 0x2B2B2B, 0x670E0F, 0x003F42, 0x57006D, 0x004E00, 0x191C94, 0x383800,
    0x562000, 0x4B2800, 0x164800, 0x69072F, 0x004626, 0x062A80, 0x2A149B, 0x0B4900,
    // luminance 1
    0x000302, 0x3D3D3D, 0x751E20, 0x00504F, 0x6A1078, 0x045C00, 0x2A2AA3, 0x4C4700,
    0x692F00, 0x593800, 0x265600, 0x751541, 0x00583D, 0x153D8F, 0x3922AE, 0x195900,
    // luminance 2
    0x000304, 0x424242, 0x7B2820, 0x025659, 0x6F1A82, 0x0A6509, 0x3034A7, 0x505100,
    0x6E3600, 0x654000, 0x2C5C00, 0x7D1E45, 0x016145, 0x1C4599, 0x422DAD, 0x1D6200,
    // luminance 3
    0x050002, 0x56555A, 0x903C3B, 0x176D72, 0x872D99, 0x1F7B15, 0x4649C1, 0x666300,
    0x844C0D, 0x735500, 0x407200, 0x91335E, 0x19745C, 0x3259AE, 0x593FC3, 0x327600,
    // luminance 4
    0x020106, 0x847E85, 0xBB6768, 0x459696, 0xAF58C3, 0x4AA73E, 0x7373EC, 0x928D11,
    0xAF7832, 0xA18020, 0x6C9E12, 0xBA5F89, 0x469F83, 0x6185DD, 0x846CEF, 0x5DA329,
    // luminance 5
    0x02000A, 0xB2ACB3, 0xE99292, 0x6CC3C1, 0xD986F0, 0x79D176, 0x9DA1FF, 0xBDBE40,
    0xDCA261, 0xD1A94C, 0x93C83D, 0xE98AB1, 0x6FCDAB, 0x8AB4FF, 0xB29AFF, 0x88CB59,
    // luminance 6
    0x02000A, 0xC7CAC9, 0xFFACAC, 0x85D8E0, 0xF39CFF, 0x92EA8A, 0xB7BAFF, 0xD6D35B,
    0xF3BE79, 0xE6C565, 0xB0E057, 0xFFA4CF, 0x89E5C8, 0xA4CAFF, 0xCAB3FF, 0xA2E57A,
    // luminance 7
    0x010101, 0xFFFFFF, 0xFFF6F2, 0xD1FFFF, 0xFFE9FF, 0xDBFFD3, 0xFDFFFF, 0xFFFFA3,
    0xFFFFC1, 0xFFFFB2, 0xFCFFA2, 0xFFEEFF, 0xD1FFFF, 0xEBFFFF, 0xFFF8FF, 0xEDFFBC,
];

pub fn rgb(index: u8) -> u32 {
    PALETTE[(index & 0x7F) as usize]
}
