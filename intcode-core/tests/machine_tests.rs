//! 机器执行测试
//!
//! 端到端测试：解析纸带并在机器上执行

mod common;
use common::{final_memory, parse, run_program, wait_for, FEEDBACK_AMPLIFIER};

use intcode_core::io::{from_fn, InputRequest};
use intcode_core::{
    ascii, HaltReason, Machine, MachineConfig, MachineError, MachineEvent, RoutedSink, Status,
    Suspension,
};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// ===== 基础运算 =====

#[test]
fn test_self_modifying_images() {
    assert_eq!(final_memory(&[1, 0, 0, 0, 99]), vec![2, 0, 0, 0, 99]);
    assert_eq!(final_memory(&[2, 3, 0, 3, 99]), vec![2, 3, 0, 6, 99]);
    assert_eq!(final_memory(&[2, 4, 4, 5, 99, 0]), vec![2, 4, 4, 5, 99, 9801]);
    assert_eq!(
        final_memory(&[1, 1, 1, 4, 99, 5, 6, 0, 99]),
        vec![30, 1, 1, 4, 2, 5, 6, 0, 99]
    );
}

#[test]
fn test_negative_immediate_operand() {
    assert_eq!(final_memory(&[1101, 100, -1, 4, 0]), vec![1101, 100, -1, 4, 99]);
}

#[test]
fn test_quine() {
    let source = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";
    let expected: Vec<i64> = parse(source).into_cells();
    assert_eq!(run_program(source, &[]), expected);
}

#[test]
fn test_sixteen_digit_output() {
    let outputs = run_program("1102,34915192,34915192,7,4,7,99,0", &[]);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].to_string().len(), 16);
}

#[test]
fn test_large_literal() {
    assert_eq!(
        run_program("104,1125899906842624,99", &[]),
        vec![1125899906842624]
    );
}

#[test]
fn test_relative_mode_matches_position_mode() {
    let mut position: Vec<i64> = vec![1, 20, 21, 22, 4, 22, 99];
    position.resize(20, 0);
    position.extend([17, 25]);

    let mut expected = Machine::new(position.clone(), []);
    let expected_outputs = expected.run().unwrap();
    assert_eq!(expected_outputs, vec![42]);

    for base in -3_i64..=6 {
        let mut relative: Vec<i64> = vec![109, base, 22201, 20 - base, 21 - base, 22 - base, 4, 22, 99];
        relative.resize(20, 0);
        relative.extend([17, 25]);

        let mut machine = Machine::new(relative, []);
        assert_eq!(machine.run().unwrap(), expected_outputs, "base {base}");
        assert_eq!(machine.relative_base(), base);
        assert_eq!(machine.memory().read(22), expected.memory().read(22));
    }
}

// ===== 比较与跳转 =====

#[test]
fn test_equal_and_less_than() {
    let cases = [
        ("3,9,8,9,10,9,4,9,99,-1,8", [(8, 1), (7, 0), (9, 0)]),
        ("3,9,7,9,10,9,4,9,99,-1,8", [(8, 0), (7, 1), (9, 0)]),
        ("3,3,1108,-1,8,3,4,3,99", [(8, 1), (7, 0), (9, 0)]),
        ("3,3,1107,-1,8,3,4,3,99", [(8, 0), (7, 1), (9, 0)]),
    ];
    for (source, expectations) in cases {
        for (input, expected) in expectations {
            assert_eq!(
                run_program(source, &[input]),
                vec![expected],
                "{source} with input {input}"
            );
        }
    }
}

#[test]
fn test_jumps() {
    for source in [
        "3,12,6,12,15,1,13,14,13,4,13,99,-1,0,1,9",
        "3,3,1105,-1,9,1101,0,0,12,4,12,99,1",
    ] {
        assert_eq!(run_program(source, &[0]), vec![0]);
        assert_eq!(run_program(source, &[5]), vec![1]);
    }
}

#[test]
fn test_compare_to_eight() {
    let source = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,\
                  1106,0,36,98,0,0,1002,21,125,20,4,20,1105,1,46,104,\
                  999,1105,1,46,1101,1000,1,20,4,20,1105,1,46,98,99";
    assert_eq!(run_program(source, &[7]), vec![999]);
    assert_eq!(run_program(source, &[8]), vec![1000]);
    assert_eq!(run_program(source, &[9]), vec![1001]);
}

// ===== 停机与故障 =====

#[test]
fn test_halted_inspection_is_idempotent() {
    let mut machine = Machine::new(parse("3,0,4,0,99"), [13]);
    let outputs = machine.run().unwrap();
    let report = machine.halt_report();

    assert_eq!(machine.run(), Err(MachineError::AlreadyHalted));
    assert_eq!(machine.outputs(), outputs.as_slice());
    assert_eq!(machine.halt_report(), report);
    assert_eq!(machine.pointer(), 4);
    assert_eq!(machine.last_value(), Some(13));
    assert_eq!(
        machine.advance(),
        Suspension::Halted(HaltReason::Completed)
    );
    assert_eq!(machine.halt_reason(), Some(&HaltReason::Completed));
}

#[test]
fn test_unknown_opcode_is_not_a_normal_halt() {
    let mut machine = Machine::new(&[1, 0, 0, 0, 98][..], []);
    let events = machine.subscribe();

    assert_eq!(
        machine.run(),
        Err(MachineError::UnknownOpcode {
            opcode: 98,
            pointer: 4
        })
    );
    let report = machine.halt_report().unwrap();
    assert!(report.reason.is_fault());
    assert_eq!(report.pointer, 4);
    assert!(events
        .try_iter()
        .any(|e| matches!(e, MachineEvent::Halted(r) if r.reason.is_fault())));
}

#[test]
fn test_invalid_mode_is_fault() {
    let mut machine = Machine::new(&[304, 0, 99][..], []);
    assert!(matches!(
        machine.run(),
        Err(MachineError::InvalidParameterMode { mode: 3, .. })
    ));
}

#[test]
fn test_external_halt_while_blocked_on_input() {
    let machine = Machine::new(&[3, 0, 99][..], []);
    let events = machine.subscribe();
    let handle = machine.spawn().unwrap();

    wait_for(&events, |e| *e == MachineEvent::WaitingForInput);
    assert_eq!(handle.controller().status(), Status::AwaitingInput);
    assert!(handle.controller().is_idle());

    handle.controller().halt();
    let machine = handle.join().unwrap();
    assert_eq!(machine.halt_reason(), Some(&HaltReason::Requested));
    assert_eq!(machine.pointer(), 0);
}

#[test]
fn test_external_halt_while_paused() {
    let config = MachineConfig {
        pause_on_output: true,
        ..MachineConfig::default()
    };
    let machine = Machine::with_config(&[104, 1, 104, 2, 99][..], [], config);
    let events = machine.subscribe();
    let handle = machine.spawn().unwrap();

    wait_for(&events, |e| *e == MachineEvent::Paused);
    handle.controller().halt();
    let machine = handle.join().unwrap();

    assert_eq!(machine.outputs(), &[1]);
    assert_eq!(machine.halt_reason(), Some(&HaltReason::Requested));
}

#[test]
fn test_halt_while_paused_does_not_resume() {
    let config = MachineConfig {
        pause_on_output: true,
        ..MachineConfig::default()
    };
    let mut machine = Machine::with_config(&[104, 1, 104, 2, 99][..], [], config);
    let events = machine.subscribe();

    assert_eq!(machine.advance(), Suspension::Output(1));
    machine.halt();
    assert_eq!(
        machine.advance(),
        Suspension::Halted(HaltReason::Requested)
    );

    let after_pause: Vec<MachineEvent> = events
        .try_iter()
        .skip_while(|e| *e != MachineEvent::Paused)
        .skip(1)
        .collect();
    assert_eq!(after_pause.len(), 1);
    assert!(matches!(
        &after_pause[0],
        MachineEvent::Halted(report) if report.reason == HaltReason::Requested
    ));
}

// ===== 输入 =====

#[test]
fn test_fifo_regardless_of_suspension_timing() {
    // 读 4 个值并原样输出
    let source = "3,20,4,20,3,20,4,20,3,20,4,20,3,20,4,20,99";
    let machine = Machine::new(parse(source), [1]);
    let controller = machine.controller();
    let handle = machine.spawn().unwrap();

    controller.input(2);
    thread::sleep(Duration::from_millis(20));
    controller.input_all([3, 4]);

    let machine = handle.join().unwrap();
    assert_eq!(machine.outputs(), &[1, 2, 3, 4]);
    assert_eq!(machine.consumed(), 4);
}

#[test]
fn test_advance_suspends_without_moving_pointer() {
    let mut machine = Machine::new(parse("3,0,4,0,99"), []);
    let events = machine.subscribe();

    assert_eq!(machine.advance(), Suspension::AwaitingInput);
    assert_eq!(machine.advance(), Suspension::AwaitingInput);
    assert_eq!(machine.pointer(), 0);

    machine.input(6);
    assert_eq!(machine.advance(), Suspension::Output(6));
    assert_eq!(
        machine.advance(),
        Suspension::Halted(HaltReason::Completed)
    );

    let received: Vec<MachineEvent> = events.try_iter().collect();
    assert_eq!(
        &received[..3],
        &[
            MachineEvent::Idle {
                idle: true,
                consumed: 0
            },
            MachineEvent::WaitingForInput,
            MachineEvent::WaitingForInput,
        ]
    );
    assert_eq!(
        received[3],
        MachineEvent::Idle {
            idle: false,
            consumed: 1
        }
    );
    assert_eq!(received[4], MachineEvent::Output(6));
}

#[test]
fn test_reactive_input_on_waiting_event() {
    // 读入 n，输出 2n，共三轮
    let source = "3,100,1002,100,2,101,4,101,1001,102,1,102,1007,102,3,103,1005,103,0,99";
    let machine = Machine::new(parse(source), []);
    let events = machine.subscribe();
    let controller = machine.controller();
    let handle = machine.spawn().unwrap();

    let mut next = 1;
    for event in events.iter() {
        match event {
            MachineEvent::WaitingForInput => {
                controller.input(next);
                next += 10;
            }
            MachineEvent::Halted(_) => break,
            _ => {}
        }
    }

    let machine = handle.join().unwrap();
    assert_eq!(machine.outputs(), &[2, 22, 42]);
}

#[test]
fn test_provider_sees_previous_outputs() {
    let source = "3,100,1002,100,2,101,4,101,1001,102,1,102,1007,102,3,103,1005,103,0,99";
    let provider = from_fn(|req: &InputRequest<'_>| Some(req.outputs.last().map_or(1, |v| v + 1)));
    let mut machine = Machine::new(parse(source), []).with_provider(provider);

    assert_eq!(machine.run().unwrap(), vec![2, 6, 14]);
}

#[test]
fn test_input_line_is_ascii() {
    let machine = Machine::new(parse("3,20,4,20,3,20,4,20,3,20,4,20,99"), []);
    machine.input_line("hi");
    let mut machine = machine;

    let outputs = machine.run().unwrap();
    assert_eq!(ascii::decode(&outputs).text, "hi\n");
}

// ===== 放大器反馈回路 =====

#[test]
fn test_feedback_loop_cooperative() {
    let config = MachineConfig {
        pause_on_output: true,
        ..MachineConfig::default()
    };
    let mut amps: Vec<Machine> = [9, 8, 7, 6, 5]
        .into_iter()
        .map(|phase| Machine::with_config(parse(FEEDBACK_AMPLIFIER), [phase], config.clone()))
        .collect();

    let mut signal = 0;
    let mut thrust = None;
    'feedback: loop {
        for (i, amp) in amps.iter_mut().enumerate() {
            amp.input(signal);
            match amp.advance() {
                Suspension::Output(value) => {
                    signal = value;
                    if i == 4 {
                        thrust = Some(value);
                    }
                }
                Suspension::Halted(_) => break 'feedback,
                Suspension::AwaitingInput => panic!("amplifier {i} starved"),
            }
        }
    }

    assert_eq!(thrust, Some(139629729));
}

#[test]
fn test_feedback_loop_threaded() {
    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = [9, 8, 7, 6, 5]
        .into_iter()
        .enumerate()
        .map(|(i, phase)| {
            let config = MachineConfig {
                pause_on_output: true,
                ..MachineConfig::default()
            }
            .labeled(format!("amp-{i}"));
            let inputs = if i == 0 { vec![phase, 0] } else { vec![phase] };
            Machine::with_config(parse(FEEDBACK_AMPLIFIER), inputs, config)
                .with_sink(RoutedSink::new(i, tx.clone()))
                .spawn()
                .unwrap()
        })
        .collect();
    drop(tx);

    let mut thrust = None;
    while let Ok((i, event)) = rx.recv_timeout(Duration::from_secs(5)) {
        match event {
            MachineEvent::Output(value) => {
                handles[(i + 1) % 5].controller().input(value);
                handles[i].controller().resume();
                if i == 4 {
                    thrust = Some(value);
                }
            }
            MachineEvent::Halted(report) if i == 4 => {
                assert_eq!(report.reason, HaltReason::Completed);
                assert_eq!(report.label.as_deref(), Some("amp-4"));
                break;
            }
            _ => {}
        }
    }

    for handle in handles {
        let amp = handle.join().unwrap();
        assert_eq!(amp.halt_reason(), Some(&HaltReason::Completed));
    }
    assert_eq!(thrust, Some(139629729));
}
