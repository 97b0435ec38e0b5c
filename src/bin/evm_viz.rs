use std::time::Duration;

use clap::{Parser, Subcommand};
use evm_visualizer::{
    catalog, disasm, gas, loader::TransactionForm, Engine, EngineConfig, ExecutionState, Scenario,
    ScenarioError, ScenarioStore, Simulation, Speed,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evm-viz", about = "Step through scripted EVM execution scenarios")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// List built-in scenarios
    List,
    /// Print the derived state at one step
    Show {
        /// Built-in scenario name or @file.json
        scenario: String,
        /// Step index
        #[arg(long, default_value_t = 0)]
        step: usize,
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
        /// Replace the transaction sender (0x..)
        #[arg(long)]
        from: Option<String>,
        /// Replace the transaction recipient (0x..)
        #[arg(long)]
        to: Option<String>,
        /// Replace the transaction value (ETH)
        #[arg(long)]
        value: Option<String>,
        /// Replace the transaction gas limit
        #[arg(long)]
        gas_limit: Option<String>,
    },
    /// Play a scenario on a timer until the last step
    Play {
        /// Built-in scenario name or @file.json
        scenario: String,
        /// Milliseconds between steps
        #[arg(long, conflicts_with = "speed")]
        interval: Option<u64>,
        /// Preset pace: slow, normal or fast
        #[arg(long)]
        speed: Option<Speed>,
    },
    /// Print a scenario as JSON
    Export {
        /// Built-in scenario name or @file.json
        scenario: String,
        /// Write to this path instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
    /// Disassemble the transaction input data
    Disasm {
        /// Built-in scenario name or @file.json
        scenario: String,
    },
    /// Gas spent per opcode
    Gas {
        /// Built-in scenario name or @file.json
        scenario: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::List => list_cmd(),
        Cmd::Show { scenario, step, json, from, to, value, gas_limit } => {
            show_cmd(&scenario, step, json, from, to, value, gas_limit)
        }
        Cmd::Play { scenario, interval, speed } => {
            play_cmd(&scenario, interval.map(Duration::from_millis).or(speed.map(Speed::interval)))
        }
        Cmd::Export { scenario, out } => export_cmd(&scenario, out.as_deref()),
        Cmd::Disasm { scenario } => disasm_cmd(&scenario),
        Cmd::Gas { scenario } => gas_cmd(&scenario),
    }
}

fn list_cmd() {
    for s in catalog::built_in() {
        let author = s.author.as_deref().unwrap_or("-");
        println!("{} ({} steps) by {}", s.name, s.steps.len(), author);
    }
}

fn show_cmd(
    scenario_arg: &str,
    step: usize,
    json: bool,
    from: Option<String>,
    to: Option<String>,
    value: Option<String>,
    gas_limit: Option<String>,
) {
    let scenario = load_scenario(scenario_arg);
    let cfg = EngineConfig::from_env().unwrap_or_else(|e| die(&e.to_string()));
    let mut sim = Simulation::new(scenario, &cfg);

    if from.is_some() || to.is_some() || value.is_some() || gas_limit.is_some() {
        let tx = sim.transaction();
        let form = TransactionForm {
            from: from.unwrap_or_else(|| tx.from.clone()),
            to: to.unwrap_or_else(|| tx.to.clone()),
            value: value.unwrap_or_else(|| tx.value.clone()),
            gas_limit: gas_limit.unwrap_or_else(|| tx.gas_limit.to_string()),
            gas_price: tx.gas_price.to_string(),
            data: tx.data.clone(),
            nonce: tx.nonce.to_string(),
        };
        let tx = form.parse().unwrap_or_else(|e| die(&e.to_string()));
        sim.set_transaction(tx);
    }

    if step > sim.total_steps() {
        die(&format!("step {step} out of range (0..={})", sim.total_steps()));
    }
    sim.seek(step);
    let state = sim.state();

    if json {
        let out = serde_json::to_string_pretty(&state).unwrap_or_else(|e| die(&e.to_string()));
        println!("{out}");
        return;
    }
    let tx = &state.transaction;
    println!("from: {}", tx.from);
    println!("to: {}", if tx.is_contract_creation() { "(contract creation)" } else { tx.to.as_str() });
    println!("step: {}/{}", state.current_step, state.total_steps);
    println!("opcode: {}", or_dash(&state.snapshot.current_opcode));
    println!("gas used: {}", state.snapshot.gas_used);
    println!("gas remaining: {}", state.snapshot.gas_remaining);
    println!("stack size: {}", state.snapshot.stack.items.len());
    for (i, v) in state.snapshot.stack.items.iter().rev().enumerate() {
        println!("[{i}] {v}");
    }
    println!("memory: {} ({} bytes)", state.snapshot.memory.preview, state.snapshot.memory.size);
    for (k, v) in &state.snapshot.storage.slots {
        println!("storage {k} = {v}");
    }
    for (addr, acc) in &state.snapshot.world_state.accounts {
        println!("account {addr} balance={} nonce={}", acc.balance, acc.nonce);
    }
}

fn play_cmd(scenario_arg: &str, interval: Option<Duration>) {
    let scenario = load_scenario(scenario_arg);
    let mut cfg = EngineConfig::from_env().unwrap_or_else(|e| die(&e.to_string()));
    if let Some(interval) = interval {
        cfg.interval = interval;
    }
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap_or_else(|e| die(&format!("runtime: {e}")));
    rt.block_on(async move {
        let engine = Engine::new(scenario, cfg);
        let mut rx = engine.subscribe();
        print_line(&engine.state());
        engine.start();
        if !engine.is_running() {
            return;
        }
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if state.current_step > 0 {
                print_line(&state);
            }
            if !state.is_running {
                break;
            }
        }
    });
}

fn export_cmd(scenario_arg: &str, out: Option<&str>) {
    let scenario = load_scenario(scenario_arg);
    let json = catalog::export_json(&scenario).unwrap_or_else(|e| die(&e.to_string()));
    match out {
        Some(path) => {
            std::fs::write(path, json).unwrap_or_else(|e| die(&format!("write scenario: {e}")))
        }
        None => println!("{json}"),
    }
}

fn disasm_cmd(scenario_arg: &str) {
    let scenario = load_scenario(scenario_arg);
    let ins = disasm::disassemble_hex(&scenario.transaction.data)
        .unwrap_or_else(|e| die(&format!("Invalid transaction data: {e}")));
    for i in ins {
        println!("{i}");
    }
}

fn gas_cmd(scenario_arg: &str) {
    let scenario = load_scenario(scenario_arg);
    for entry in gas::gas_profile(&scenario) {
        println!("{:<10} {:>6} gas ({:.1}%)", entry.opcode, entry.gas, entry.share);
    }
}

fn print_line(state: &ExecutionState) {
    let snap = &state.snapshot;
    println!(
        "step={:02}/{:02} op={:12} gas={} remaining={} stack={} top={}",
        state.current_step,
        state.total_steps,
        or_dash(&snap.current_opcode),
        snap.gas_used,
        snap.gas_remaining,
        snap.stack.items.len(),
        snap.stack.top().unwrap_or("-"),
    );
}

fn load_scenario(arg: &str) -> Scenario {
    let result = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(ScenarioError::from)
            .and_then(|text| catalog::import_json(&text)),
        None => ScenarioStore::new().get(arg),
    };
    result.unwrap_or_else(|e| die(&e.to_string()))
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn die(msg: &str) -> ! { eprintln!("{}", msg); std::process::exit(1); }
