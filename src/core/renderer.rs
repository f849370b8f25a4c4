//! Top-down terminal view of the arena.
//!
//! Only the renderer-visible parts of the world are read: player position,
//! rotation, health and role; projectile position and owner.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, Borders, Gauge, Paragraph,
    },
    Frame,
};

use crate::core::session::{Phase, Session};
use crate::sim::{Role, Vec3, WorldSnapshot, state::STARTING_HEALTH};

/// Half-width of the visible area, in world units.
const VIEW_HALF_SPAN: f64 = 15.0;

fn role_color(role: Role) -> Color {
    match role {
        Role::Host => Color::Cyan,
        Role::Guest => Color::Red,
    }
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::Host => "DAVID (host)",
        Role::Guest => "GOLIATH (guest)",
    }
}

pub fn render(frame: &mut Frame, session: &Session, local_id: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(frame.area());

    render_health(frame, chunks[0], session.view());

    match session.view() {
        Some(world) => render_arena(frame, chunks[1], world, session.role()),
        None => frame.render_widget(
            Paragraph::new("Waiting for the host's first state...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" ARENA ")),
            chunks[1],
        ),
    }

    frame.render_widget(
        Paragraph::new(status_line(session, local_id))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );
}

fn render_health(frame: &mut Frame, area: Rect, world: Option<&WorldSnapshot>) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (slot, role) in halves.iter().zip(Role::ALL) {
        let health = world
            .and_then(|w| w.players.get(&role))
            .map(|p| p.health)
            .unwrap_or(STARTING_HEALTH);
        let ratio = (health as f64 / STARTING_HEALTH as f64).clamp(0.0, 1.0);
        frame.render_widget(
            Gauge::default()
                .block(Block::default().borders(Borders::ALL).title(role_title(role)))
                .gauge_style(Style::default().fg(role_color(role)))
                .ratio(ratio)
                .label(format!("{health} hp")),
            *slot,
        );
    }
}

fn render_arena(frame: &mut Frame, area: Rect, world: &WorldSnapshot, local: Role) {
    let center = world
        .players
        .get(&local)
        .map(|p| p.position)
        .unwrap_or(Vec3::ZERO);
    let (cx, cz) = (center.x as f64, center.z as f64);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" ARENA "))
        .marker(Marker::Braille)
        .x_bounds([cx - VIEW_HALF_SPAN, cx + VIEW_HALF_SPAN])
        .y_bounds([cz - VIEW_HALF_SPAN, cz + VIEW_HALF_SPAN])
        .paint(|ctx| {
            for player in world.players.values() {
                let color = role_color(player.player_id);
                let (x, z) = (player.position.x as f64, player.position.z as f64);
                let facing = Vec3::forward(player.rotation.y);
                let reach = player.radius as f64 * 1.8;
                ctx.draw(&Circle {
                    x,
                    y: z,
                    radius: player.radius as f64,
                    color,
                });
                ctx.draw(&CanvasLine::new(
                    x,
                    z,
                    x + facing.x as f64 * reach,
                    z + facing.z as f64 * reach,
                    color,
                ));
                ctx.print(x, z - player.radius as f64 - 0.8, player.player_id.as_str());
            }
            for projectile in &world.projectiles {
                ctx.draw(&Points {
                    coords: &[(projectile.position.x as f64, projectile.position.z as f64)],
                    color: role_color(projectile.owner_id),
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn status_line(session: &Session, local_id: &str) -> String {
    let controls = "[WASD] move  [←/→] turn  [SPACE] attack  [Q] quit";
    match session.phase() {
        Phase::Negotiating => match session.role() {
            Role::Host => format!("Waiting for guest. Share your endpoint id: {local_id}"),
            Role::Guest => "Connecting to host...".to_string(),
        },
        Phase::Active => match session.view().and_then(|w| w.outcome()) {
            Some(winner) if winner == session.role() => format!("Victory!  {controls}"),
            Some(_) => format!("Defeated.  {controls}"),
            None => controls.to_string(),
        },
        Phase::Ended => "Peer disconnected. Press [Q] to leave.".to_string(),
    }
}
