//! Scripted line construction from command-line arguments.

use std::{collections::VecDeque, str::FromStr};

use anyhow::{anyhow, Result};
use transit_core::{SimulationSnapshot, StationId};
use transit_rendering::FrameInput;

/// Ordered station identifiers describing one line, parsed from `"0,1,2"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LineArg {
    stations: Vec<StationId>,
}

impl FromStr for LineArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let stations = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map(StationId::new)
                    .map_err(|error| format!("invalid station id `{part}`: {error}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if stations.is_empty() {
            return Err("a line needs at least one station id".to_owned());
        }
        Ok(Self { stations })
    }
}

/// Converts line arguments into one frame of input per gesture.
///
/// Each line is opened by activating its first station and extended by
/// dragging over the remaining ones, exactly as a player would draw it.
pub(crate) fn gestures(
    lines: &[LineArg],
    snapshot: &SimulationSnapshot,
) -> Result<VecDeque<FrameInput>> {
    let mut script = VecDeque::new();
    for (line_index, line) in lines.iter().enumerate() {
        for (position_in_line, station) in line.stations.iter().enumerate() {
            let position = snapshot
                .stations
                .iter()
                .find(|candidate| candidate.id == *station)
                .map(|candidate| candidate.position)
                .ok_or_else(|| {
                    anyhow!(
                        "line {line_index}: station {} does not exist ({} stations on the map)",
                        station.get(),
                        snapshot.stations.len()
                    )
                })?;

            let opening = position_in_line == 0;
            script.push_back(FrameInput {
                cursor_world_space: Some(position),
                activate: opening,
                dragging: !opening,
                reset_requested: false,
            });
        }
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_simulation::{Simulation, SimulationConfig};

    #[test]
    fn parses_comma_separated_station_ids() {
        let line: LineArg = " 0, 3 ,1 ".parse().expect("valid line");

        assert_eq!(
            line.stations,
            vec![StationId::new(0), StationId::new(3), StationId::new(1)]
        );
    }

    #[test]
    fn rejects_empty_or_malformed_lines() {
        assert!(",".parse::<LineArg>().is_err());
        assert!("0,x".parse::<LineArg>().is_err());
    }

    #[test]
    fn lines_become_activate_then_drag_frames() {
        let simulation = Simulation::new(SimulationConfig::seeded(1)).expect("valid config");
        let snapshot = simulation.snapshot();
        let lines = vec![
            "0,2".parse().expect("valid line"),
            "4".parse().expect("valid line"),
        ];

        let script = gestures(&lines, &snapshot).expect("stations exist");

        assert_eq!(script.len(), 3);
        assert!(script[0].activate && !script[0].dragging);
        assert_eq!(
            script[0].cursor_world_space,
            Some(snapshot.stations[0].position)
        );
        assert!(script[1].dragging && !script[1].activate);
        assert_eq!(
            script[1].cursor_world_space,
            Some(snapshot.stations[2].position)
        );
        assert!(script[2].activate);
    }

    #[test]
    fn unknown_station_is_reported() {
        let simulation = Simulation::new(SimulationConfig::seeded(1)).expect("valid config");
        let lines = vec!["0,42".parse().expect("valid line")];

        let error = gestures(&lines, &simulation.snapshot()).expect_err("station 42 is missing");

        assert!(error.to_string().contains("station 42"));
    }
}
