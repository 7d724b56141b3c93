//! Pure combinational arithmetic/logic unit (§4.2). Does not touch the status
//! register itself; the driver copies carry/overflow into the next flags and
//! derives zero/positive from the result once it lands in ACC.

use turtle_isa::ArithLogicFunction;
use turtle_util::DataBusValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub result: DataBusValue,
    pub carry: bool,
    pub overflow: bool,
}

pub fn execute(a: DataBusValue, b: DataBusValue, function: ArithLogicFunction) -> AluOutput {
    debug!("executing ALU with inputs: {:?}, {:?}, {}", a, b, function);

    use ArithLogicFunction::*;
    match function {
        Add => {
            let result = a + b;
            let carry = a.unsigned() + b.unsigned() > DataBusValue::MAX_UNSIGNED;
            let overflow = same_sign(a, b) && sign(result) != sign(a);
            AluOutput { result, carry, overflow }
        }
        Sub => {
            let result = a - b;
            let carry = a.unsigned() < b.unsigned();
            let overflow = sign(a) != sign(b) && sign(result) != sign(a);
            AluOutput { result, carry, overflow }
        }
        And => AluOutput { result: a & b, carry: false, overflow: false },
        Or => AluOutput { result: a | b, carry: false, overflow: false },
        Xor => AluOutput { result: a ^ b, carry: false, overflow: false },
        Inv => AluOutput { result: !a, carry: false, overflow: false },
    }
}

fn sign(v: DataBusValue) -> bool {
    v.is_negative()
}

fn same_sign(a: DataBusValue, b: DataBusValue) -> bool {
    sign(a) == sign(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: i64) -> DataBusValue {
        DataBusValue::new(n).unwrap()
    }

    #[test]
    fn add_wraps_at_max_signed_with_overflow() {
        let out = execute(v(DataBusValue::MAX_SIGNED), v(1), ArithLogicFunction::Add);
        assert_eq!(out.result.signed(), DataBusValue::MIN_SIGNED);
        assert!(out.overflow);
        assert!(!out.carry);
    }

    #[test]
    fn sub_at_min_signed_minus_one_overflows() {
        let out = execute(v(DataBusValue::MIN_SIGNED), v(1), ArithLogicFunction::Sub);
        assert_eq!(out.result.signed(), DataBusValue::MAX_SIGNED);
        assert!(out.overflow);
    }

    #[test]
    fn add_past_max_unsigned_wraps_with_carry() {
        let out = execute(DataBusValue::from_unsigned(DataBusValue::MAX_UNSIGNED), v(1), ArithLogicFunction::Add);
        assert_eq!(out.result.unsigned(), 0);
        assert!(out.carry);
    }

    #[test]
    fn sub_sets_carry_on_borrow() {
        let out = execute(v(0), v(1), ArithLogicFunction::Sub);
        assert!(out.carry);
    }

    #[test]
    fn inv_complements_all_bits() {
        let out = execute(DataBusValue::from_unsigned(0x0F), v(0), ArithLogicFunction::Inv);
        assert_eq!(out.result.unsigned(), 0xF0);
        assert!(!out.carry && !out.overflow);
    }

    #[test]
    fn bitwise_ops_never_set_flags() {
        for func in [ArithLogicFunction::And, ArithLogicFunction::Or, ArithLogicFunction::Xor] {
            let out = execute(v(5), v(3), func);
            assert!(!out.carry && !out.overflow);
        }
    }

    proptest::proptest! {
        #[test]
        fn add_result_matches_wrapped_unsigned_sum(a: u8, b: u8) {
            let out = execute(DataBusValue::from_unsigned(a as u32), DataBusValue::from_unsigned(b as u32), ArithLogicFunction::Add);
            let expected = (a as u32 + b as u32) % (DataBusValue::MAX_UNSIGNED + 1);
            proptest::prop_assert_eq!(out.result.unsigned(), expected);
            proptest::prop_assert_eq!(out.carry, a as u32 + b as u32 > DataBusValue::MAX_UNSIGNED);
        }

        #[test]
        fn sub_result_matches_wrapped_unsigned_difference(a: u8, b: u8) {
            let out = execute(DataBusValue::from_unsigned(a as u32), DataBusValue::from_unsigned(b as u32), ArithLogicFunction::Sub);
            let modulus = DataBusValue::MAX_UNSIGNED as i64 + 1;
            let expected = (a as i64 - b as i64).rem_euclid(modulus) as u32;
            proptest::prop_assert_eq!(out.result.unsigned(), expected);
            proptest::prop_assert_eq!(out.carry, (a as u32) < (b as u32));
        }
    }
}
