// Copyright 2026 by the cfsao developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

use std::fs::File;
use std::time::Duration;

use itertools::Itertools;
use log::{debug, error, info, warn};

use cfsao::calendar::{half_day, half_day_label, is_early_arrival};
use cfsao::{io, solver, verify, ObjectiveWeights, Solution, SolveStatus, SolverConfig, Student};

fn main() {
    // Setup logging & parse command line arguments
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "This is the Career Fair Session Assignment Optimizer (cfsao), version {}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );
    let args = parse_cli_args();

    if args.get_one::<String>("OUTPUT").is_none() && !args.get_flag("print") {
        warn!("No OUTPUT file and no --print option given. Assignments will not be exported anywhere.");
    }

    // Parse objective weights list
    let weights = match args.get_one::<String>("weights") {
        Some(weights_raw) => {
            let parsed = weights_raw
                .split(',')
                .map(|w| w.trim().parse::<i64>())
                .collect::<Result<Vec<i64>, std::num::ParseIntError>>()
                .unwrap_or_else(|e| {
                    error!("Could not parse wish weights: {}", e);
                    std::process::exit(exitcode::DATAERR)
                });
            if parsed.len() != 3 {
                error!(
                    "Expected exactly 3 wish weights (for ranks 3, 4, 5), got {}.",
                    parsed.len()
                );
                std::process::exit(exitcode::DATAERR)
            }
            ObjectiveWeights {
                wish3: parsed[0],
                wish4: parsed[1],
                wish5: parsed[2],
            }
        }
        None => ObjectiveWeights::default(),
    };

    // Open and read input file
    let inpath: &String = args.get_one("INPUT").unwrap();
    debug!("Opening input file {} ...", inpath);
    let file = File::open(inpath).unwrap_or_else(|e| {
        error!("Could not open input file {}: {}", inpath, e);
        std::process::exit(exitcode::NOINPUT)
    });
    let capacity_buffer: f64 = *args.get_one("capacity_buffer").unwrap();
    let (students, rooms, families) =
        io::simple::read(file, capacity_buffer).unwrap_or_else(|e| {
            error!("Could not read input file: {}", e);
            std::process::exit(exitcode::DATAERR)
        });

    // In debug build: Check consistency of imported data
    if cfg!(debug_assertions) {
        io::assert_data_consistency(&students, &rooms, &families);
    }

    info!(
        "Found {} students, {} rooms and {} presentations for session assignment.",
        students.len(),
        rooms.len(),
        families.total()
    );
    debug!("Rooms:\n{}", io::debug_list_of_rooms(&rooms));

    if students.is_empty() {
        error!("Calculating session assignments is only possible with 1 or more students.");
        std::process::exit(exitcode::DATAERR);
    }

    let config = SolverConfig {
        num_workers: *args
            .get_one("num_workers")
            .unwrap_or(&(num_cpus::get() as u32)),
        max_wall_seconds: args.get_one::<f64>("time_limit").copied(),
        log_progress: args.get_flag("log_search"),
        weights,
        ..SolverConfig::default()
    };

    // Group students by half-day; each group is solved independently. Invalid arrival codes
    // survive grouping and are rejected by the solver's input validation.
    let groups = students
        .into_iter()
        .map(|student| (half_day(student.arrival_code), student))
        .into_group_map();

    let mut results: Vec<(u8, Vec<Student>, Solution, Option<bool>)> = Vec::new();
    let mut rank5_honored: usize = 0;
    for hd in groups.keys().copied().sorted() {
        let mut group = groups[&hd].clone();
        for (i, student) in group.iter_mut().enumerate() {
            student.index = i;
        }
        let early = group
            .iter()
            .filter(|s| is_early_arrival(s.arrival_code))
            .count();
        info!(
            "=== Half-day {} ({}): {} students ({} early, {} late) ===",
            hd,
            half_day_label(hd),
            group.len(),
            early,
            group.len() - early
        );

        let (solution, constraints_ok) =
            match solver::solve(&group, &rooms, &families, &config) {
                Ok(solution) if solution.status.is_success() => {
                    let report = verify::verify(
                        &solution,
                        &group,
                        &rooms,
                        &families,
                        &config.weights,
                    );
                    if report.all_passed() {
                        info!("All constraints verified.\n{}", report);
                    } else {
                        error!("Constraint verification failed!\n{}", report);
                    }
                    let usage = verify::wish_rank_usage(&solution, &group);
                    info!(
                        "Honored wishes by rank: 1: {}, 2: {}, 3: {}, 4: {}, 5: {}",
                        usage[0], usage[1], usage[2], usage[3], usage[4]
                    );
                    rank5_honored += usage[4];
                    (solution, Some(report.all_passed()))
                }
                Ok(solution) => {
                    warn!("Half-day {} ended with status {}.", hd, solution.status);
                    (solution, None)
                }
                Err(e) => {
                    error!("Half-day {} aborted: {}", hd, e);
                    (
                        Solution::empty(
                            group.len(),
                            families.total(),
                            rooms.len(),
                            SolveStatus::ModelInvalid,
                            Duration::ZERO,
                        ),
                        None,
                    )
                }
            };
        results.push((hd, group, solution, constraints_ok));
    }

    // Global summary
    let total_students: usize = results.iter().map(|(_, group, _, _)| group.len()).sum();
    let total_penalty: i64 = results.iter().map(|(_, _, solution, _)| solution.objective).sum();
    let solved = results
        .iter()
        .filter(|(_, _, solution, _)| solution.status.is_success())
        .count();
    info!(
        "Finished {} of {} half-days for {} students with a summed penalty of {}.",
        solved,
        results.len(),
        total_students,
        total_penalty
    );
    info!(
        "Students kept within wish ranks 1-4: {:.1}% ({} had their rank-5 wish honored).",
        100.0 * (1.0 - rank5_honored as f64 / total_students as f64),
        rank5_honored
    );

    if let Some(outpath) = args.get_one::<String>("OUTPUT") {
        debug!("Opening output file {} ...", outpath);
        match File::create(outpath) {
            Err(e) => error!("Could not open output file {}: {}.", outpath, e),
            Ok(file) => {
                let documents = results
                    .iter()
                    .map(|(hd, group, solution, constraints_ok)| {
                        io::simple::solution_to_json(
                            *hd,
                            solution,
                            group,
                            &rooms,
                            &families,
                            *constraints_ok,
                        )
                    })
                    .collect();
                match io::simple::write(file, documents) {
                    Ok(_) => debug!("Assignments written to {}.", outpath),
                    Err(e) => error!("Could not write assignments to {}: {}.", outpath, e),
                }
            }
        }
    }

    if args.get_flag("print") {
        for (hd, group, solution, _) in results.iter() {
            print!(
                "========== {} ==========\n{}\n{}",
                half_day_label(*hd),
                io::format_solution(solution, group, &rooms, &families),
                io::format_student_schedules(solution, group, &rooms, &families)
            );
        }
    }

    if solved == 0 {
        warn!("No feasible assignment found for any half-day.");
        std::process::exit(1);
    }
}

/// Helper function to construct and execute parser for command line options
fn parse_cli_args() -> clap::ArgMatches {
    clap::command!()
        .arg(
            clap::Arg::new("num_workers")
                .long("num-workers")
                .help(
                    "Number of parallel workers of the MILP engine. Defaults to number of \
                     detected CPU cores.",
                )
                .value_name("WORKERS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("time_limit")
                .short('t')
                .long("time-limit")
                .help(
                    "Wall-clock deadline per half-day in seconds. On expiry the engine returns \
                     its best-known assignment instead of a proven optimum.",
                )
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            clap::Arg::new("capacity_buffer")
                .short('b')
                .long("capacity-buffer")
                .help(
                    "Absorption buffer applied to every room capacity while reading the input, \
                     to compensate for no-shows. The solver treats the inflated capacity as the \
                     hard cap.",
                )
                .value_name("FACTOR")
                .value_parser(clap::value_parser!(f64))
                .default_value("1.2"),
        )
        .arg(
            clap::Arg::new("weights")
                .short('w')
                .long("wish-weights")
                .help(
                    "Comma-separated penalty weights for honoring wishes 3, 4 and 5, e.g. \
                     1,5,10. Use 1,5,11 to strictly prefer two rank-4 wishes over one rank-5 \
                     wish.",
                )
                .value_name("WEIGHTS"),
        )
        .arg(
            clap::Arg::new("log_search")
                .long("log-search")
                .help("Let the MILP engine print its search log to the console")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("print")
                .short('p')
                .long("print")
                .help("Print the calculated session assignments to stdout in a human readable format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("OUTPUT")
                .help("Sets the output file to use")
                .index(2),
        )
        .get_matches()
}
