// Answer a batch of matrix requests on a contracted graph.
// Takes a graph directory, a JSON file with an array of requests and optionally a file to write the results to.
// Results go to stdout as a JSON array if no output file is given, the run report goes to stdout in any case.

use std::{env, error::Error, fs::File, io::BufReader, path::Path};

#[macro_use]
extern crate core_matrix;
use core_matrix::{
    algo::{core_matrix::*, weighting::FastestWeighting},
    cli::parse_arg,
    datastr::graph::*,
    io::*,
    matrix::*,
    report::*,
};

use rayon::prelude::*;

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("core_matrix");
    report!("num_threads", rayon::current_num_threads());

    let mut args = env::args().skip(1);
    let graph_dir: String = parse_arg(&mut args, "No graph directory arg given")?;
    let requests_file: String = parse_arg(&mut args, "No requests file arg given")?;
    let output_file = args.next();

    let graph = report_time("loading graph", || RoadGraph::reconstruct_from(&Path::new(&graph_dir)))?;
    let levels = graph.levels().ok_or(MatrixError::NotContracted)?;
    report!("graph", { "num_nodes": graph.num_nodes(), "num_arcs": graph.num_arcs(), "num_edges": graph.num_edges(), "core_level": levels.core_level() });

    let requests: Vec<MatrixRequest> = serde_json::from_reader(BufReader::new(File::open(&requests_file)?))?;
    report!("num_requests", requests.len());

    let config = MatrixConfig::default();
    report!("max_visited_nodes", config.max_visited_nodes);
    let weighting = FastestWeighting::new();

    // the reporter is thread local, so workers only collect their stats
    let answers = report_time("answering requests", || {
        requests
            .par_iter()
            .map_init(
                || Server::new(&graph, &weighting, config),
                |server, request| -> Result<_, MatrixError> {
                    let server = server.as_mut().map_err(|e| e.clone())?;
                    let (result, time) = measure(|| server.compute(request));
                    Ok((result?, *server.stats(), time))
                },
            )
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut queries_ctxt = push_collection_context("queries".to_string());
    for (request, (_, stats, time)) in requests.iter().zip(&answers) {
        let _query_ctxt = queries_ctxt.push_collection_item();
        report!("num_sources", request.sources.len());
        report!("num_destinations", request.destinations.len());
        report!("running_time_ms", time.as_secs_f64() * 1000.0);
        report!("stats", stats);
    }
    drop(queries_ctxt);

    let results: Vec<&MatrixResult> = answers.iter().map(|(result, _, _)| result).collect();
    match output_file {
        Some(output_file) => serde_json::to_writer(File::create(output_file)?, &results)?,
        None => println!("{}", serde_json::to_string(&results)?),
    }

    Ok(())
}
