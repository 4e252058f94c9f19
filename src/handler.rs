// Rocket routes for the Battlesnake API
//
// Each route unpacks the game state and hands it to the managed Bot; the
// decision logic itself lives in the library crate.

use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::Value;

use lookahead_snake::bot::Bot;
use lookahead_snake::types::GameState;

/// GET /
/// API version and snake customization
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /start
#[post("/start", format = "json", data = "<start_req>")]
pub fn start(bot: &rocket::State<Bot>, start_req: Json<GameState>) -> Status {
    bot.start(&start_req.game, &start_req.turn, &start_req.board, &start_req.you);
    Status::Ok
}

/// POST /move
/// Answers `{"move": "<direction>"}` within the configured time budget
#[post("/move", format = "json", data = "<move_req>")]
pub async fn get_move(bot: &rocket::State<Bot>, move_req: Json<GameState>) -> Json<Value> {
    let response = bot
        .get_move(&move_req.game, &move_req.turn, &move_req.board, &move_req.you)
        .await;

    Json(response)
}

/// POST /end
#[post("/end", format = "json", data = "<end_req>")]
pub fn end(bot: &rocket::State<Bot>, end_req: Json<GameState>) -> Status {
    bot.end(&end_req.game, &end_req.turn, &end_req.board, &end_req.you);
    Status::Ok
}
