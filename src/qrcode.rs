#![forbid(unsafe_code)]
//! QR code symbol encoding.
//!
//! This module turns a payload string into a [`QrMatrix`] following the QR Code Model 2
//! standard (ISO/IEC 18004): versions 1 to 40, four error correction levels and automatic
//! selection of the numeric, alphanumeric or byte segment mode. The smallest version that holds the data at
//! the requested error correction level is chosen, and the mask with the lowest penalty score
//! is applied.
use serde::Serialize;

/// An immutable QR Code symbol, a square grid of dark and light modules.
///
/// A matrix is produced once per generation and is never mutated afterwards.
///
/// # Example
///
/// ```rust
/// use qrkit::qrcode::{QrCodeEcc, QrMatrix};
///
/// let qr = QrMatrix::encode_text("Hello, World!", QrCodeEcc::Medium).unwrap();
/// assert_eq!(qr.version().value(), 1);
/// assert_eq!(qr.size(), 21);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrMatrix {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,

    /// The width and height of this QR Code, measured in modules, between
    /// 21 and 177 (inclusive). This is equal to version * 4 + 17.
    size: i32,

    /// Row-major modules of this QR Code (true = dark).
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes a text string into a QR code at exactly the given error correction level.
    ///
    /// The segment mode is picked from the content: numeric for pure digits, alphanumeric
    /// for the 45-character QR charset, byte mode (UTF-8) otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DataTooLong`] if the text does not fit in a version 40 symbol at `ecl`.
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self, DataTooLong> {
        let seg = QrSegment::for_text(text);
        Self::encode_segments(&[seg], ecl, Version::MIN, Version::MAX, None)
    }

    /// Encodes arbitrary binary data in byte mode.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self, DataTooLong> {
        let seg = QrSegment::make_bytes(data);
        Self::encode_segments(&[seg], ecl, Version::MIN, Version::MAX, None)
    }

    /// Encodes the given segments using the smallest version in `minversion..=maxversion`
    /// that holds them. `mask` is `None` for automatic selection or a fixed pattern.
    pub fn encode_segments(
        segs: &[QrSegment],
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>
    ) -> Result<Self, DataTooLong> {
        let (datacodewords, version) = encode_segments_to_codewords(
            segs,
            ecl,
            minversion,
            maxversion
        )?;
        Ok(Self::encode_codewords(&datacodewords, ecl, version, mask))
    }

    /// Builds the symbol from already padded data codewords.
    fn encode_codewords(
        datacodewords: &[u8],
        ecl: QrCodeEcc,
        version: Version,
        mask: Option<Mask>
    ) -> Self {
        let mut canvas = Canvas::new(version);
        canvas.draw_function_patterns(ecl);
        let allcodewords = add_ecc_and_interleave(datacodewords, version, ecl);
        canvas.draw_codewords(&allcodewords);

        let mask = mask.unwrap_or_else(|| canvas.choose_mask(ecl));
        canvas.apply_mask(mask);
        canvas.draw_format_bits(ecl, mask);

        QrMatrix {
            version,
            ecl,
            mask,
            size: canvas.size,
            modules: canvas.modules,
        }
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's side length in modules, in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Returns the error correction level the symbol was built with.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the QR
    /// code's bounds return `false`, so callers can iterate over the quiet zone freely.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size;
        range.contains(&x) && range.contains(&y) && self.modules[(y * self.size + x) as usize]
    }

    /// Number of dark modules in the symbol.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

/// Mutable module grid used while a symbol is being drawn.
struct Canvas {
    version: Version,
    size: i32,
    modules: Vec<bool>,
    isfunction: Vec<bool>,
}

impl Canvas {
    fn new(version: Version) -> Self {
        let size = i32::from(version.value()) * 4 + 17;
        let count = (size * size) as usize;
        Self {
            version,
            size,
            modules: vec![false; count],
            isfunction: vec![false; count],
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.size + x) as usize
    }

    fn get(&self, x: i32, y: i32) -> bool {
        self.modules[self.index(x, y)]
    }

    fn set_function_module(&mut self, x: i32, y: i32, isdark: bool) {
        let index = self.index(x, y);
        self.modules[index] = isdark;
        self.isfunction[index] = true;
    }

    fn draw_function_patterns(&mut self, ecl: QrCodeEcc) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns never overlap the three finder corners
        let alignpatpos = alignment_pattern_positions(self.version);
        let numalign = alignpatpos.len();
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                if
                    (i == 0 && j == 0) ||
                    (i == 0 && j == numalign - 1) ||
                    (i == numalign - 1 && j == 0)
                {
                    continue;
                }
                self.draw_alignment_pattern(pos0, pos1);
            }
        }

        // Reserve the format areas, real bits are drawn after masking
        self.draw_format_bits(ecl, Mask::new(0));
        self.draw_version();
    }

    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let xx = x + dx;
                let yy = y + dy;
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dist: i32 = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                self.set_function_module(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    fn draw_version(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = {
            let mut rem: u32 = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
            }
            (ver << 12) | rem
        };
        for i in 0u8..18 {
            let bit: bool = get_bit(bits, i);
            let a: i32 = self.size - 11 + i32::from(i % 3);
            let b: i32 = i32::from(i / 3);
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits: u32 = {
            let data = u32::from((ecl.format_bits() << 3) | mask.value());
            let mut rem: u32 = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };

        // First copy, around the top-left finder
        for i in 0..6 {
            self.set_function_module(8, i32::from(i), get_bit(bits, i));
        }
        self.set_function_module(8, 7, get_bit(bits, 6));
        self.set_function_module(8, 8, get_bit(bits, 7));
        self.set_function_module(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function_module(14 - i32::from(i), 8, get_bit(bits, i));
        }

        // Second copy, split between the other two finders
        let size = self.size;
        for i in 0..8 {
            self.set_function_module(size - 1 - i32::from(i), 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i32::from(i), get_bit(bits, i));
        }
        self.set_function_module(8, size - 8, true);
    }

    fn draw_codewords(&mut self, data: &[u8]) {
        assert_eq!(
            data.len(),
            get_num_raw_data_modules(self.version) / 8,
            "Illegal argument"
        );
        let size: i32 = self.size;
        let mut i: usize = 0;
        let mut right: i32 = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x = right - j;
                    let upward: bool = ((right + 1) & 2) == 0;
                    let y = if upward { size - 1 - vert } else { vert };
                    let index = self.index(x, y);
                    if !self.isfunction[index] && i < data.len() * 8 {
                        self.modules[index] = get_bit(data[i >> 3].into(), 7 - ((i as u8) & 7));
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, data.len() * 8);
    }

    /// XORs the data area with the mask pattern. Applying the same mask twice undoes it.
    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let index = self.index(x, y);
                if self.isfunction[index] {
                    continue;
                }
                let invert: bool = match mask.value() {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => ((x * y) % 2) + ((x * y) % 3) == 0,
                    6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
                    7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
                    _ => unreachable!(),
                };
                self.modules[index] ^= invert;
            }
        }
    }

    fn choose_mask(&mut self, ecl: QrCodeEcc) -> Mask {
        let mut best = Mask::new(0);
        let mut minpenalty = i32::MAX;
        for i in 0u8..8 {
            let candidate = Mask::new(i);
            self.apply_mask(candidate);
            self.draw_format_bits(ecl, candidate);
            let penalty: i32 = self.get_penalty_score();
            if penalty < minpenalty {
                best = candidate;
                minpenalty = penalty;
            }
            self.apply_mask(candidate);
        }
        best
    }

    fn get_penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size: i32 = self.size;

        // Runs and finder-like patterns in rows
        for y in 0..size {
            let mut runcolor = false;
            let mut runx: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for x in 0..size {
                if self.get(x, y) == runcolor {
                    runx += 1;
                    if runx == 5 {
                        result += PENALTY_N1;
                    } else if runx > 5 {
                        result += 1;
                    }
                } else {
                    runhistory.add_history(runx);
                    if !runcolor {
                        result += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = self.get(x, y);
                    runx = 1;
                }
            }
            result += runhistory.terminate_and_count(runcolor, runx) * PENALTY_N3;
        }

        // Same for columns
        for x in 0..size {
            let mut runcolor = false;
            let mut runy: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for y in 0..size {
                if self.get(x, y) == runcolor {
                    runy += 1;
                    if runy == 5 {
                        result += PENALTY_N1;
                    } else if runy > 5 {
                        result += 1;
                    }
                } else {
                    runhistory.add_history(runy);
                    if !runcolor {
                        result += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = self.get(x, y);
                    runy = 1;
                }
            }
            result += runhistory.terminate_and_count(runcolor, runy) * PENALTY_N3;
        }

        // 2x2 blocks of one color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color: bool = self.get(x, y);
                if
                    color == self.get(x + 1, y) &&
                    color == self.get(x, y + 1) &&
                    color == self.get(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Balance of dark and light modules
        let dark = self.modules.iter().filter(|&&dark| dark).count() as i32;
        let total = size * size;
        let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }
}

/// Concatenates the segments, adds terminator and padding, and returns the data codewords
/// together with the smallest version that fits them.
fn encode_segments_to_codewords(
    segs: &[QrSegment],
    ecl: QrCodeEcc,
    minversion: Version,
    maxversion: Version
) -> Result<(Vec<u8>, Version), DataTooLong> {
    assert!(minversion <= maxversion, "Invalid value");

    let mut version: Version = minversion;
    let datausedbits: usize = loop {
        let datacapacitybits: usize = get_num_data_codewords(version, ecl) * 8;
        let dataused: Option<usize> = QrSegment::get_total_bits(segs, version);
        match dataused {
            Some(n) if n <= datacapacitybits => {
                break n;
            }
            _ if version >= maxversion => {
                return Err(match dataused {
                    None => DataTooLong::SegmentTooLong,
                    Some(n) => DataTooLong::DataOverCapacity(n, datacapacitybits),
                });
            }
            _ => {
                version = Version::new(version.value() + 1);
            }
        }
    };

    let datacapacitybits: usize = get_num_data_codewords(version, ecl) * 8;
    let mut bb = BitBuffer::new();
    for seg in segs {
        bb.append_bits(seg.mode.mode_bits(), 4);
        // get_total_bits() already checked numchars against the count field width
        bb.append_bits(seg.numchars as u32, seg.mode.num_char_count_bits(version));
        for i in 0..seg.data.len() {
            bb.append_bits(u32::from(seg.data.bit(i)), 1);
        }
    }
    debug_assert_eq!(bb.len(), datausedbits);

    // Terminator, then pad up to a byte boundary
    let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.len());
    bb.append_bits(0, numzerobits as u8);
    let numzerobits: usize = bb.len().wrapping_neg() & 7;
    bb.append_bits(0, numzerobits as u8);
    debug_assert_eq!(bb.len() % 8, 0);

    for &padbyte in [0xec, 0x11].iter().cycle() {
        if bb.len() >= datacapacitybits {
            break;
        }
        bb.append_bits(padbyte, 8);
    }
    Ok((bb.into_bytes(), version))
}

/// Splits the data into blocks, appends Reed-Solomon ECC to each and interleaves them.
fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    assert_eq!(data.len(), get_num_data_codewords(ver, ecl));
    let numblocks: usize = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
    let blockecclen: usize = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
    let rawcodewords: usize = get_num_raw_data_modules(ver) / 8;
    let numshortblocks: usize = numblocks - (rawcodewords % numblocks);
    let shortblockdatalen: usize = rawcodewords / numblocks - blockecclen;

    let mut result = vec![0u8; rawcodewords];
    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut dat: &[u8] = data;
    for i in 0..numblocks {
        let datlen: usize = shortblockdatalen + usize::from(i >= numshortblocks);
        let ecc = rs.compute_remainder(&dat[..datlen]);
        let mut k: usize = i;
        for (j, &byte) in dat[..datlen].iter().enumerate() {
            if j == shortblockdatalen {
                k -= numshortblocks;
            }
            result[k] = byte;
            k += numblocks;
        }
        let mut k: usize = data.len() + i;
        for &byte in &ecc {
            result[k] = byte;
            k += numblocks;
        }
        dat = &dat[datlen..];
    }
    debug_assert_eq!(dat.len(), 0);
    result
}

fn alignment_pattern_positions(ver: Version) -> Vec<i32> {
    let ver: i32 = i32::from(ver.value());
    if ver == 1 {
        return Vec::new();
    }
    let numalign: i32 = ver / 7 + 2;
    let step: i32 = if ver == 32 {
        26
    } else {
        ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
    };
    let size = ver * 4 + 17;
    let mut result: Vec<i32> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

fn get_num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result: usize = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign: usize = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

fn get_num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    get_num_raw_data_modules(ver) / 8 -
        table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl) *
            table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

/// Largest payload, in bytes, that fits a version 40 symbol in byte mode at `ecl`.
pub fn max_byte_capacity(ecl: QrCodeEcc) -> usize {
    let databits = get_num_data_codewords(Version::MAX, ecl) * 8;
    let headerbits = 4 + usize::from(QrSegmentMode::Byte.num_char_count_bits(Version::MAX));
    (databits - headerbits) / 8
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

struct ReedSolomonGenerator {
    divisor: [u8; 30],
    degree: usize,
}

impl ReedSolomonGenerator {
    fn new(degree: usize) -> Self {
        let mut result = Self {
            divisor: [0u8; 30],
            degree,
        };
        assert!((1..=result.divisor.len()).contains(&degree), "Degree out of range");
        let divisor: &mut [u8] = &mut result.divisor[..degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Self::multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Self::multiply(root, 0x02);
        }
        result
    }

    fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree];
        for b in data {
            let factor: u8 = b ^ result[0];
            result.copy_within(1.., 0);
            result[self.degree - 1] = 0;
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= Self::multiply(y, factor);
            }
        }
        result
    }

    /// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x^2 + 1.
    fn multiply(x: u8, y: u8) -> u8 {
        let mut z: u8 = 0;
        for i in (0..8).rev() {
            z = (z << 1) ^ ((z >> 7) * 0x1d);
            z ^= ((y >> i) & 1) * x;
        }
        z
    }
}

struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size; // Light border in front of the first run
        }
        let len: usize = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        i32::from(
            n > 0 &&
                rh[2] == n &&
                rh[3] == n * 3 &&
                rh[4] == n &&
                rh[5] == n &&
                (rh[0] >= n * 4 || rh[6] >= n * 4)
        )
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    #[serde(rename = "L")]
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[serde(rename = "M")]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    #[serde(rename = "Q")]
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    #[serde(rename = "H")]
    High,
}

impl QrCodeEcc {
    /// Parses a level letter, case-insensitively. Anything unrecognised yields `Medium`.
    pub fn from_code(code: &str) -> Self {
        use QrCodeEcc::*;
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Low,
            "Q" => Quartile,
            "H" => High,
            _ => Medium,
        }
    }

    /// The single-letter name of this level.
    pub fn code(self) -> &'static str {
        use QrCodeEcc::*;
        match self {
            Low => "L",
            Medium => "M",
            Quartile => "Q",
            High => "H",
        }
    }

    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// A segment of data in a QR code, in numeric, alphanumeric or byte mode.
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: BitBuffer,
}

impl QrSegment {
    /// Picks the most compact mode that can represent the whole text.
    pub fn for_text(text: &str) -> Self {
        Self::make_numeric(text)
            .or_else(|| Self::make_alphanumeric(text))
            .unwrap_or_else(|| Self::make_bytes(text.as_bytes()))
    }

    /// Creates a segment for binary data in byte mode.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer::new();
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Self {
            mode: QrSegmentMode::Byte,
            numchars: data.len(),
            data: bb,
        }
    }

    /// Creates a numeric segment, or `None` if `text` has anything other than digits.
    pub fn make_numeric(text: &str) -> Option<Self> {
        if !Self::is_numeric(text) {
            return None;
        }
        let mut bb = BitBuffer::new();
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Some(Self {
            mode: QrSegmentMode::Numeric,
            numchars: text.len(),
            data: bb,
        })
    }

    /// Creates an alphanumeric segment, or `None` if `text` falls outside the QR charset.
    ///
    /// Allowed characters: 0–9, A–Z (uppercase), space, `$`, `%`, `*`, `+`, `-`, `.`, `/`, `:`.
    pub fn make_alphanumeric(text: &str) -> Option<Self> {
        let indices: Vec<usize> = text
            .chars()
            .map(|c| ALPHANUMERIC_CHARSET.find(c))
            .collect::<Option<_>>()?;
        let mut bb = BitBuffer::new();
        for pair in indices.chunks(2) {
            match *pair {
                [a, b] => bb.append_bits(u32::try_from(a * 45 + b).ok()?, 11),
                [a] => bb.append_bits(u32::try_from(a).ok()?, 6),
                _ => unreachable!(),
            }
        }
        Some(Self {
            mode: QrSegmentMode::Alphanumeric,
            numchars: indices.len(),
            data: bb,
        })
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Total bits needed to encode the segments at `version`, or `None` when a segment's
    /// character count overflows its length field.
    fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if let Some(limit) = (1usize).checked_shl(ccbits.into()) {
                if seg.numchars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl QrSegmentMode {
    fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
        }
    }

    fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (
            match self {
                Numeric => [10, 12, 14],
                Alphanumeric => [9, 11, 13],
                Byte => [8, 16, 16],
            }
        )[usize::from((ver.value() + 7) / 17)]
    }
}

/// Growable big-endian bit sequence.
#[derive(Default)]
struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    fn new() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        self.length
    }

    fn bit(&self, i: usize) -> bool {
        get_bit(self.data[i >> 3].into(), 7 - ((i as u8) & 7))
    }

    fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            if self.length % 8 == 0 {
                self.data.push(0);
            }
            let shift: u8 = 7 - ((self.length as u8) & 7);
            let bit: u8 = ((val >> i) as u8) & 1;
            if let Some(last) = self.data.last_mut() {
                *last |= bit << shift;
            }
            self.length += 1;
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Error type for when data exceeds QR code capacity.
///
/// Ways to handle this error include lowering the error correction level, shortening the
/// payload, or reporting it to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTooLong {
    /// A segment is too long for its character count field.
    SegmentTooLong,
    /// Data length exceeds capacity.
    DataOverCapacity(usize, usize),
}

impl core::fmt::Display for DataTooLong {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::SegmentTooLong => write!(f, "Segment too long"),
            Self::DataOverCapacity(datalen, maxcapacity) =>
                write!(f, "Data length = {} bits, Max capacity = {} bits", datalen, maxcapacity),
        }
    }
}

impl std::error::Error for DataTooLong {}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}

fn get_bit(x: u32, i: u8) -> bool {
    ((x >> i) & 1) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(QrSegment::is_numeric("1234567890"));
        assert!(!QrSegment::is_numeric("1234abc"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(QrSegment::is_alphanumeric("HELLO WORLD"));
        assert!(!QrSegment::is_alphanumeric("Hello World"));
    }

    #[test]
    fn test_segment_mode_selection() {
        assert_eq!(QrSegment::for_text("0123").mode(), QrSegmentMode::Numeric);
        assert_eq!(QrSegment::for_text("HTTPS://A.B").mode(), QrSegmentMode::Alphanumeric);
        assert_eq!(QrSegment::for_text("https://a.b").mode(), QrSegmentMode::Byte);
        assert_eq!(QrSegment::for_text("héllo").num_chars(), 6);
    }

    #[test]
    fn test_version_one_fits_short_text() {
        let qr = QrMatrix::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
        assert_eq!(qr.version(), Version::new(1));
        assert_eq!(qr.size(), 21);
        assert_eq!(qr.error_correction_level(), QrCodeEcc::Low);
    }

    #[test]
    fn test_higher_ecl_grows_version() {
        let text = "https://example.com/some/fairly/long/path?with=query";
        let low = QrMatrix::encode_text(text, QrCodeEcc::Low).unwrap();
        let high = QrMatrix::encode_text(text, QrCodeEcc::High).unwrap();
        assert!(high.version() > low.version());
        assert_eq!(high.size(), i32::from(high.version().value()) * 4 + 17);
    }

    #[test]
    fn test_finder_patterns_present() {
        let qr = QrMatrix::encode_text("finder", QrCodeEcc::Medium).unwrap();
        let last = qr.size() - 1;
        for &(x, y) in &[(0, 0), (last, 0), (0, last)] {
            assert!(qr.get_module(x, y));
        }
        // Separator ring around the top-left finder is always light
        assert!(!qr.get_module(7, 0));
        assert!(!qr.get_module(0, 7));
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, qr.size()));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = QrMatrix::encode_text("same input", QrCodeEcc::Quartile).unwrap();
        let b = QrMatrix::encode_text("same input", QrCodeEcc::Quartile).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_mask_is_kept() {
        let seg = QrSegment::for_text("MASK");
        let qr = QrMatrix::encode_segments(
            &[seg],
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            Some(Mask::new(5))
        ).unwrap();
        assert_eq!(qr.mask(), Mask::new(5));
    }

    #[test]
    fn test_max_byte_capacity_levels() {
        assert_eq!(max_byte_capacity(QrCodeEcc::Low), 2953);
        assert_eq!(max_byte_capacity(QrCodeEcc::Medium), 2331);
        assert_eq!(max_byte_capacity(QrCodeEcc::Quartile), 1663);
        assert_eq!(max_byte_capacity(QrCodeEcc::High), 1273);
    }

    #[test]
    fn test_capacity_boundary_high() {
        let cap = max_byte_capacity(QrCodeEcc::High);
        let fits = "a".repeat(cap);
        let qr = QrMatrix::encode_text(&fits, QrCodeEcc::High).unwrap();
        assert_eq!(qr.version(), Version::MAX);

        let over = "a".repeat(cap + 1);
        match QrMatrix::encode_text(&over, QrCodeEcc::High) {
            Err(DataTooLong::DataOverCapacity(used, capacity)) => assert!(used > capacity),
            other => panic!("expected capacity error, got {:?}", other.map(|q| q.version())),
        }
    }

    #[test]
    fn test_from_code_falls_back_to_medium() {
        assert_eq!(QrCodeEcc::from_code("h"), QrCodeEcc::High);
        assert_eq!(QrCodeEcc::from_code("q"), QrCodeEcc::Quartile);
        assert_eq!(QrCodeEcc::from_code("bogus"), QrCodeEcc::Medium);
        assert_eq!(QrCodeEcc::from_code(""), QrCodeEcc::Medium);
    }

    #[test]
    fn test_reed_solomon_remainder_length() {
        let rs = ReedSolomonGenerator::new(10);
        let ecc = rs.compute_remainder(&[0x10, 0x20, 0x0c, 0x56, 0x61, 0x80]);
        assert_eq!(ecc.len(), 10);
        assert_eq!(ReedSolomonGenerator::multiply(0x02, 0x80), 0x1d);
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(Version::new(1)).is_empty());
        assert_eq!(alignment_pattern_positions(Version::new(2)), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(Version::new(7)), vec![6, 22, 38]);
        assert_eq!(alignment_pattern_positions(Version::new(32)), vec![6, 34, 60, 86, 112, 138]);
    }
}
