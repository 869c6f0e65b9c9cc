//! TIA palette decode.
//!
//! The TIA emits a 4-bit hue phase and a 3-bit luminance per pixel. The
//! RGB table is produced once from fixed per-hue (I, Q) chroma
//! coefficients through the standard YIQ decode matrix, with a mild gamma
//! lift and per-channel clipping. PAL consoles use a different chroma
//! table: hues 0, 1, 14 and 15 collapse to grey.

/// (I, Q) chroma coefficients per hue, NTSC encoding.
const NTSC_IQ: [(f64, f64); 16] = [
    (0.000, 0.000),
    (0.144, -0.126),
    (0.231, -0.277),
    (0.243, -0.387),
    (0.217, -0.451),
    (0.117, -0.375),
    (0.021, -0.255),
    (-0.066, -0.105),
    (-0.139, 0.035),
    (-0.182, 0.170),
    (-0.175, 0.269),
    (-0.134, 0.326),
    (-0.033, 0.290),
    (0.083, 0.252),
    (0.169, 0.196),
    (0.184, 0.100),
];

/// (I, Q) chroma coefficients per hue, PAL encoding.
const PAL_IQ: [(f64, f64); 16] = [
    (0.000, 0.000),
    (0.000, 0.000),
    (0.222, -0.032),
    (0.241, -0.160),
    (0.214, -0.271),
    (0.130, -0.340),
    (0.006, -0.345),
    (-0.115, -0.281),
    (-0.199, -0.156),
    (-0.235, -0.006),
    (-0.210, 0.138),
    (-0.130, 0.245),
    (-0.012, 0.291),
    (0.109, 0.264),
    (0.000, 0.000),
    (0.000, 0.000),
];

const GAMMA: f64 = 0.9;

fn channel(value: f64) -> u32 {
    let clipped = value.clamp(0.0, 1.0);
    (clipped.powf(GAMMA) * 255.0) as u32
}

/// Build the 128-entry 0x00RRGGBB table for one chroma encoding: 16 hues
/// by 8 luminance steps, indexed `hue * 8 + lum`.
fn decode(iq: &[(f64, f64); 16]) -> [u32; 128] {
    let mut table = [0u32; 128];
    for (hue, &(i, q)) in iq.iter().enumerate() {
        for lum in 0..8 {
            let y = lum as f64 / 7.0;
            let r = y + 0.956 * i + 0.621 * q;
            let g = y - 0.272 * i - 0.647 * q;
            let b = y - 1.106 * i + 1.703 * q;
            table[hue * 8 + lum] = (channel(r) << 16) | (channel(g) << 8) | channel(b);
        }
    }
    table
}

pub fn ntsc() -> &'static [u32; 128] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<[u32; 128]> = OnceLock::new();
    TABLE.get_or_init(|| decode(&NTSC_IQ))
}

pub fn pal() -> &'static [u32; 128] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<[u32; 128]> = OnceLock::new();
    TABLE.get_or_init(|| decode(&PAL_IQ))
}
