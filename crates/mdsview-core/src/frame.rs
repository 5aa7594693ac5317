//! # Register Frame Decoder
//!
//! Recovers a switched-out thread's registers from the context the scheduler
//! pushed onto its stack.
//!
//! ## Architecture detection
//!
//! The firmware does not announce its architecture, so we probe for symbols
//! only one port defines:
//!
//! - `g_mcause` (trap cause mirror) exists only in the RISC-V port
//! - `PendSV_Handler` is the Cortex-M context switch exception
//!
//! RISC-V wins if both are present. The probe is cheap but the host should
//! still run it once per session (see [`Inspector::architecture`]).
//!
//! ## Saved contexts
//!
//! | Architecture | Frame                                         | Word  |
//! |--------------|-----------------------------------------------|-------|
//! | RISC-V       | `mepc, ra, mstatus, fcsr, tp, t0-t2, s0-s1, a0-a7, s2-s11, t3-t6` | XLEN |
//! | ARM Thumb    | `r4-r11`, then hardware `r0-r3, r12, lr, pc, psr` | 32 bit |
//! | ARM Thumb, FPU | `exc_flag, r4-r11, [s16-s31]`, then hardware `r0-r3, r12, lr, pc, psr, [s0-s15, fpscr, rsv]` | 32 bit |
//!
//! An FPU-enabled kernel saves the bracketed FPU words only when bit 4 of
//! `exc_flag` is clear, so the frame size depends on the thread. In every case
//! the thread's stack pointer before the switch is the context pointer plus
//! the size of the frame that was actually saved.
//!
//! [`Inspector::architecture`]: crate::Inspector::architecture

use tracing::{debug, trace};

use crate::error::{InspectError, Result};
use crate::layout::FrameSlot;
use crate::oracle::{FieldReader, MemoryOracle};
use crate::types::{Address, Architecture, RegisterId, RegisterSet};

/// Symbol only present in RISC-V builds
pub const RISCV_MARKER: &str = "g_mcause";

/// Symbol only present in ARM Cortex-M builds
pub const ARM_MARKER: &str = "PendSV_Handler";

/// Probe the target's symbols for its architecture
///
/// ## Errors
///
/// [`InspectError::UnsupportedArchitecture`] if neither marker symbol exists.
pub fn detect_architecture<O: MemoryOracle + ?Sized>(oracle: &O) -> Result<Architecture>
{
    let architecture = if oracle.symbol_address(RISCV_MARKER)?.is_some() {
        Architecture::RiscV
    } else if oracle.symbol_address(ARM_MARKER)?.is_some() {
        Architecture::ArmThumb
    } else {
        return Err(InspectError::UnsupportedArchitecture);
    };
    debug!(%architecture, "Detected target architecture");
    Ok(architecture)
}

/// Decode the saved context at `context` into a register set
///
/// Slots the frame does not save stay unset, except:
/// - RISC-V `x0` is always zero and `gp` comes from the live core register
///   (unset if the oracle cannot provide it)
/// - ARM `r15` mirrors the saved `pc`
pub fn decode_frame<O: MemoryOracle + ?Sized>(
    reader: FieldReader<'_, O>,
    architecture: Architecture,
    context: Address,
) -> Result<RegisterSet>
{
    let layout = reader.layout();
    let frame = match (architecture, &layout.arm_fpu) {
        (Architecture::ArmThumb, Some(fpu)) => {
            let exc_flag = reader.read(context, &fpu.exc_flag)?;
            let frame = fpu.select(exc_flag);
            trace!(%context, exc_flag, size = frame.size, "Selected FPU context frame");
            frame
        }
        _ => layout.frame(architecture),
    };
    let mut regs = RegisterSet::new(architecture);

    for (field, slot) in &frame.slots {
        let value = reader.read(context, field)?;
        match *slot {
            FrameSlot::Pc => {
                regs.set(RegisterId::Pc, value);
            }
            FrameSlot::Status => {
                regs.set(RegisterId::Status, value);
            }
            FrameSlot::General(idx) => {
                regs.set(RegisterId::General(idx), value);
            }
            FrameSlot::Skip => {}
        }
    }

    regs.set(RegisterId::Sp, (context + frame.size).value());

    match architecture {
        Architecture::RiscV => {
            regs.set(RegisterId::General(0), 0);
            if let Some(gp) = reader.oracle().core_register("gp")? {
                regs.set(RegisterId::General(3), gp);
            }
        }
        Architecture::ArmThumb => {
            regs.set(RegisterId::General(15), regs.pc.value());
        }
    }

    Ok(regs)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::InspectorConfig;
    use crate::image::{Endian, MemoryImage};
    use crate::layout::KernelLayout;

    #[test]
    fn test_detect_prefers_riscv()
    {
        let mut image = MemoryImage::new(Endian::Little);
        assert!(matches!(detect_architecture(&image), Err(InspectError::UnsupportedArchitecture)));

        image.add_symbol(ARM_MARKER, Address::new(0x800), 4);
        assert_eq!(detect_architecture(&image).unwrap(), Architecture::ArmThumb);

        image.add_symbol(RISCV_MARKER, Address::new(0x2000_0000), 4);
        assert_eq!(detect_architecture(&image).unwrap(), Architecture::RiscV);
    }

    #[test]
    fn test_arm_frame_order()
    {
        let layout = KernelLayout::new(&InspectorConfig::default()).unwrap();
        let mut image = MemoryImage::new(Endian::Little);
        let context = Address::new(0x2000_0400);
        image.add_segment(context, vec![0; 64]);
        // r4..r11 = 4..11, r0..r3 = 0..3, r12 = 12, lr, pc, psr
        let words = [4, 5, 6, 7, 8, 9, 10, 11, 0, 1, 2, 3, 12, 0x0800_0101, 0x0800_0200, 0x0100_0000];
        for (idx, word) in words.iter().enumerate() {
            image.write_scalar(context + idx as u64 * 4, 4, *word).unwrap();
        }

        let regs = decode_frame(FieldReader::new(&image, &layout), Architecture::ArmThumb, context).unwrap();
        for r in 0..=12u8 {
            assert_eq!(regs.get(RegisterId::General(r)), Some(u64::from(r)));
        }
        assert_eq!(regs.sp, Address::new(0x2000_0440));
        assert_eq!(regs.get(RegisterId::General(14)), Some(0x0800_0101));
        assert_eq!(regs.get(RegisterId::General(15)), Some(0x0800_0200));
        assert_eq!(regs.pc, Address::new(0x0800_0200));
        assert_eq!(regs.status, 0x0100_0000);
    }

    fn fpu_context(image: &mut MemoryImage, context: Address, exc_flag: u64, fpu_words: bool)
    {
        image.add_segment(context, vec![0; 204]);
        let mut words = vec![exc_flag, 4, 5, 6, 7, 8, 9, 10, 11];
        if fpu_words {
            words.extend([0x3F80_0000; 16]);
        }
        words.extend([0, 1, 2, 3, 12, 0x0800_0101, 0x0800_0300, 0x0100_0000]);
        for (idx, word) in words.iter().enumerate() {
            image.write_scalar(context + idx as u64 * 4, 4, *word).unwrap();
        }
    }

    #[test]
    fn test_arm_fpu_standard_frame()
    {
        let layout = KernelLayout::new(&InspectorConfig::default().with_arm_fpu(true)).unwrap();
        let mut image = MemoryImage::new(Endian::Little);
        let context = Address::new(0x2000_0800);
        fpu_context(&mut image, context, 0xFFFF_FFFD, false);

        let regs = decode_frame(FieldReader::new(&image, &layout), Architecture::ArmThumb, context).unwrap();
        assert_eq!(regs.get(RegisterId::General(4)), Some(4));
        assert_eq!(regs.get(RegisterId::General(3)), Some(3));
        assert_eq!(regs.pc, Address::new(0x0800_0300));
        assert_eq!(regs.status, 0x0100_0000);
        assert_eq!(regs.sp, Address::new(0x2000_0844));
    }

    #[test]
    fn test_arm_fpu_extended_frame()
    {
        let layout = KernelLayout::new(&InspectorConfig::default().with_arm_fpu(true)).unwrap();
        let mut image = MemoryImage::new(Endian::Little);
        let context = Address::new(0x2000_0800);
        fpu_context(&mut image, context, 0xFFFF_FFED, true);

        let regs = decode_frame(FieldReader::new(&image, &layout), Architecture::ArmThumb, context).unwrap();
        for r in 0..=12u8 {
            assert_eq!(regs.get(RegisterId::General(r)), Some(u64::from(r)));
        }
        assert_eq!(regs.get(RegisterId::General(14)), Some(0x0800_0101));
        assert_eq!(regs.pc, Address::new(0x0800_0300));
        assert_eq!(regs.get(RegisterId::General(15)), Some(0x0800_0300));
        assert_eq!(regs.sp, Address::new(0x2000_08CC));
    }
}
