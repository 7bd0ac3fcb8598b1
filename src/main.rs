//! Match runner: spawn one agent process per car, run a full match,
//! print each player's final score.

use std::env;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use starchase_core::{AgentController, MatchConfig, SimulationWorld};
use starchase_protocol::PipeAgent;

struct Args {
    programs: Vec<String>,
    seed: Option<u32>,
}

fn parse_args() -> Result<Args, String> {
    let mut programs = Vec::new();
    let mut seed = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                seed = Some(value.parse().map_err(|_| format!("bad seed: {value}"))?);
            }
            _ => programs.push(arg),
        }
    }
    if programs.is_empty() {
        return Err("usage: starchase [--seed N] PROGRAM...".to_owned());
    }
    Ok(Args { programs, seed })
}

fn run(args: Args) -> Result<(), String> {
    let config = MatchConfig::default();
    if args.programs.len() > config.car_count {
        return Err(format!(
            "at most {} players, got {}",
            config.car_count,
            args.programs.len()
        ));
    }

    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos())
            .unwrap_or(1)
    });
    info!("seed {seed}, {} players", args.programs.len());

    let mut world =
        SimulationWorld::new(config, seed).map_err(|placement| placement.to_string())?;

    let mut agents: Vec<Box<dyn AgentController>> = Vec::new();
    for program in &args.programs {
        let agent = PipeAgent::spawn(program)
            .map_err(|spawn| format!("failed to start {program}: {spawn}"))?;
        agents.push(Box::new(agent));
    }

    let heartbeat = world.config().tick_rate * 5;
    loop {
        let done = world
            .step(&mut agents)
            .map_err(|placement| placement.to_string())?;
        if world.tick() % heartbeat == 0 {
            info!("tick {}: scores {:?}", world.tick(), world.scores());
        }
        if done {
            break;
        }
    }

    for agent in &mut agents {
        agent.shutdown();
    }

    // Final standings, one player per line.
    for (program, score) in args.programs.iter().zip(world.scores()) {
        println!("{program}\t{score}");
    }

    // Unmanned cars still have scores worth seeing in the log.
    if args.programs.len() < world.config().car_count {
        warn!(
            "{} cars ran without a player",
            world.config().car_count - args.programs.len()
        );
        info!("all scores: {:?}", world.scores());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match parse_args().and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
