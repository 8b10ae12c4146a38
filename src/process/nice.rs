// Niceness to scheduling weight
use crate::process::pcb::ProcessError;

pub const MIN_NICE: i32 = -20;
pub const MAX_NICE: i32 = 19;

/// Weight of a nice-0 process
pub const NICE_0_WEIGHT: u32 = 1024;

/// Each step of niceness changes the weight by roughly 1.25x
static NICE_TO_WEIGHT: [u32; 40] = [
    /* -20 */ 88761, 71755, 56483, 46273, 36291,
    /* -15 */ 29154, 23254, 18705, 14949, 11916,
    /* -10 */ 9548, 7620, 6100, 4904, 3906,
    /*  -5 */ 3121, 2501, 1991, 1586, 1277,
    /*   0 */ 1024, 820, 655, 526, 423,
    /*   5 */ 335, 272, 215, 172, 137,
    /*  10 */ 110, 87, 70, 56, 45,
    /*  15 */ 36, 29, 23, 18, 15,
];

/// Scheduling weight for `nice`, or `OutOfRange` outside [-20, 19]
pub fn weight(nice: i32) -> Result<u32, ProcessError> {
    if !(MIN_NICE..=MAX_NICE).contains(&nice) {
        return Err(ProcessError::OutOfRange);
    }
    Ok(NICE_TO_WEIGHT[(nice - MIN_NICE) as usize])
}
