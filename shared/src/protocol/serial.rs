//! Little-endian field access on raw byte sequences.

pub fn rd_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let field = bytes.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([field[0], field[1]]))
}

pub fn rd_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let field = bytes.get(offset..offset.checked_add(8)?)?;
    let mut raw = [0; 8];
    raw.copy_from_slice(field);
    Some(u64::from_le_bytes(raw))
}

pub fn rd_i64(bytes: &[u8], offset: usize) -> Option<i64> {
    rd_u64(bytes, offset).map(|value| value as i64)
}

pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn push_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Overwrite a field in place. Returns false if the sequence is too short.
pub fn wr_u16(bytes: &mut [u8], offset: usize, value: u16) -> bool {
    match bytes.get_mut(offset..offset + 2) {
        Some(field) => {
            field.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

/// Overwrite a field in place. Returns false if the sequence is too short.
pub fn wr_u64(bytes: &mut [u8], offset: usize, value: u64) -> bool {
    match bytes.get_mut(offset..offset + 8) {
        Some(field) => {
            field.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}
