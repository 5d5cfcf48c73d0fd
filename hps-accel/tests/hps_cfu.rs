use cfuflow_std::pack_words;
use hps_accel::constants::*;
use hps_accel::post_process::post_process;
use hps_accel::{Activation, CfuConfig, Command, CommandProcessor, OutputParams, RegisterId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Op = ((u32, u32, u32, u32), u32);

fn cfu() -> CommandProcessor { CommandProcessor::new(CfuConfig::default().with_filter_store_depth(100)) }

fn run_ops(cfu: &mut CommandProcessor, ops: impl IntoIterator<Item = Op>) {
    for (step, ((funct3, reg, in0, in1), expected)) in ops.into_iter().enumerate() {
        let actual = cfu.execute_raw(funct3, reg, in0, in1);
        assert_eq!(actual, expected, "step {step}: op {funct3} reg {reg:#x} ({in0}, {in1})");
    }
}

fn expected_macc(offset: i32, input: &[i8], filter: &[i8]) -> u32 {
    input.iter().zip(filter).map(|(i, f)| (offset + i32::from(*i)) * i32::from(*f)).sum::<i32>() as u32
}

fn check_macc(offset: i32, input: &[i8], filter: &[i8]) -> Vec<Op> {
    let input_words = pack_words(input);
    let filter_words = pack_words(filter);

    let mut ops = vec![((INS_SET, REG_INPUT_NUM_WORDS, input_words.len() as u32, 0), 0)];
    ops.extend(input_words.iter().map(|word| ((INS_SET, REG_SET_INPUT, *word, 0), 0)));
    ops.push(((INS_SET, REG_FILTER_NUM_WORDS, filter_words.len() as u32, 0), 0));
    ops.extend(filter_words.iter().map(|word| ((INS_SET, REG_SET_FILTER, *word, 0), 0)));
    ops.push(((INS_SET, REG_INPUT_OFFSET, offset as u32, 0), 0));

    for (input, filter) in input.chunks(WINDOW_LANES).zip(filter.chunks(WINDOW_LANES)) {
        ops.push(((INS_PING, 0, 0, 0), 0));
        ops.push(((INS_GET, REG_MACC_OUT, 0, 0), expected_macc(offset, input, filter)));
        ops.push(((INS_SET, REG_FILTER_INPUT_NEXT, 1, 0), 0));
    }
    ops
}

#[test]
fn ping_instruction() {
    let mut cfu = cfu();
    run_ops(&mut cfu, [((INS_PING, 0, 1, 2), 0), ((INS_PING, 0, 12, 4), 3), ((INS_PING, 0, 0, 0), 16)]);
}

#[test]
fn simple() {
    run_ops(&mut cfu(), [
        ((INS_PING, 0, 1, 2), 0),
        ((INS_PING, 0, 0, 0), 3),
        ((INS_SET, REG_VERIFY, 0, 0), 0),
        ((INS_GET, REG_VERIFY, 0, 0), 1),
        ((INS_SET, REG_VERIFY, 10, 0), 0),
        ((INS_GET, REG_VERIFY, 0, 0), 11),
        ((INS_GET, REG_VERIFY, 0, 0), 11),
        ((INS_PING, 0, 0, 0), 0),
        ((INS_GET, REG_VERIFY, 0, 0), 11),
    ]);
}

#[test]
fn multiply_accumulate_empty_inputs() {
    let mut ops = vec![
        ((INS_SET, REG_INPUT_NUM_WORDS, 0, 0), 0),
        ((INS_SET, REG_FILTER_NUM_WORDS, 0, 0), 0),
        ((INS_SET, REG_INPUT_OFFSET, 0, 0), 0),
    ];
    for _ in 0..10 {
        ops.extend((0..10).map(|_| ((INS_GET, REG_MACC_OUT, 0, 0), 0)));
        ops.push(((INS_SET, REG_FILTER_INPUT_NEXT, 1, 0), 0));
    }
    run_ops(&mut cfu(), ops);
}

#[test]
fn multiply_accumulate_one_iteration() {
    let lanes = (0..16).collect::<Vec<i8>>();
    run_ops(&mut cfu(), check_macc(12, &lanes, &lanes));
}

#[test]
fn multiply_accumulate() {
    let mut rng = StdRng::seed_from_u64(1234);
    let offset = rng.gen_range(-128..=127);
    let input = (0..160).map(|_| rng.gen::<i8>()).collect::<Vec<_>>();
    let filter = (0..160).map(|_| rng.gen::<i8>()).collect::<Vec<_>>();
    run_ops(&mut cfu(), check_macc(offset, &input, &filter));
}

#[test]
fn multiply_accumulate_wraps_to_first_window() {
    let mut rng = StdRng::seed_from_u64(7);
    let offset = rng.gen_range(-128..=127);
    let input = (0..32).map(|_| rng.gen::<i8>()).collect::<Vec<_>>();
    let filter = (0..32).map(|_| rng.gen::<i8>()).collect::<Vec<_>>();

    let mut cfu = cfu();
    run_ops(&mut cfu, check_macc(offset, &input, &filter));
    cfu.ping(0, 0);
    assert_eq!(cfu.get(RegisterId::MaccOut), expected_macc(offset, &input[..16], &filter[..16]));
}

#[test]
fn macc_result_lags_window_changes_until_ping() {
    let lanes = (0..16).collect::<Vec<i8>>();
    let mut cfu = cfu();
    run_ops(&mut cfu, check_macc(12, &lanes, &lanes));
    cfu.set(RegisterId::InputOffset, 0);
    assert_eq!(cfu.get(RegisterId::MaccOut), expected_macc(12, &lanes, &lanes));
    cfu.ping(0, 0);
    assert_eq!(cfu.get(RegisterId::MaccOut), expected_macc(0, &lanes, &lanes));
}

fn check_store_readback(num_words: u32, set: u32, reads: [u32; 4]) {
    let mut ops = vec![((INS_SET, num_words, 20, 0), 0)];
    ops.extend((100..120).map(|n| ((INS_SET, set, n, 0), 0)));
    for n in (100..120).step_by(4) {
        ops.extend(reads.iter().zip(n..).map(|(reg, value)| ((INS_GET, *reg, 0, 0), value)));
        ops.push(((INS_SET, REG_FILTER_INPUT_NEXT, 1, 0), 0));
    }
    run_ops(&mut cfu(), ops);
}

#[test]
fn simple_input_store() {
    check_store_readback(REG_INPUT_NUM_WORDS, REG_SET_INPUT, [REG_INPUT_0, REG_INPUT_1, REG_INPUT_2, REG_INPUT_3]);
}

#[test]
fn simple_filter_store() {
    check_store_readback(REG_FILTER_NUM_WORDS, REG_SET_FILTER, [
        REG_FILTER_0,
        REG_FILTER_1,
        REG_FILTER_2,
        REG_FILTER_3,
    ]);
}

#[test]
fn filter_word_count_clamped_to_depth() {
    let mut cfu = cfu();
    cfu.set(RegisterId::FilterNumWords, 1000);
    assert_eq!(cfu.filter_store().num_words(), 100);
}

#[test]
fn gets_are_idempotent() {
    let lanes = (0..16).map(|lane| lane - 8).collect::<Vec<i8>>();
    let mut cfu = cfu();
    run_ops(&mut cfu, check_macc(-3, &lanes, &lanes));
    let snapshot = RegisterId::ALL.iter().map(|reg| cfu.get(*reg)).collect::<Vec<_>>();
    for _ in 0..3 {
        assert_eq!(RegisterId::ALL.iter().map(|reg| cfu.execute(Command::Get(*reg))).collect::<Vec<_>>(), snapshot);
    }
}

#[test]
fn independent_instances() {
    let mut a = cfu();
    let mut b = cfu();
    a.set(RegisterId::Verify, 5);
    a.ping(2, 2);
    assert_eq!(b.get(RegisterId::Verify), VERIFY_RESET_VALUE);
    assert_eq!(b.ping(0, 0), 0);
    assert_eq!(a.ping(0, 0), 4);
}

#[test]
fn post_process_random_channels() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let activation = Activation { offset: -128, min: -128, max: 127 };
    let channels = (0..16)
        .map(|_| OutputParams {
            bias: rng.gen(),
            multiplier: rng.gen_range(0x4000_0000..0x8000_0000_u32) as i32,
            shift: rng.gen_range(4..11),
        })
        .collect::<Vec<_>>();

    let mut ops = vec![
        ((INS_SET, REG_OUTPUT_OFFSET, activation.offset as u32, 0), 0),
        ((INS_SET, REG_OUTPUT_MIN, activation.min as u32, 0), 0),
        ((INS_SET, REG_OUTPUT_MAX, activation.max as u32, 0), 0),
        ((INS_SET, REG_OUTPUT_PARAMS_RESET, 0, 0), 0),
    ];
    for params in &channels {
        ops.push(((INS_SET, REG_OUTPUT_BIAS, params.bias as u32, 0), 0));
        ops.push(((INS_SET, REG_OUTPUT_MULTIPLIER, params.multiplier as u32, 0), 0));
        ops.push(((INS_SET, REG_OUTPUT_SHIFT, u32::from(params.shift), 0), 0));
    }
    for params in channels.iter().cycle().take(40) {
        let acc = rng.gen_range(-50_000..50_000);
        let expected = i32::from(post_process(acc, params, &activation)) as u32;
        ops.push(((INS_POST_PROCESS, PP_POST_PROCESS, acc as u32, 0), expected));
    }

    let mut cfu = cfu();
    run_ops(&mut cfu, ops);
    assert_eq!(cfu.output_params().len(), 16);
    assert_eq!(cfu.output_params().read_pos(), 40 % 16);
}
