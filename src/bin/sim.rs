use battleship_hub::sim;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let report = sim::play(seed1, seed2).await?;
    let winner = if report.winner == report.player1.player_id {
        "player1"
    } else {
        "player2"
    };

    let result = json!({
        "player1": {"shots": report.player1.shots, "hits": report.player1.hits},
        "player2": {"shots": report.player2.shots, "hits": report.player2.hits},
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
