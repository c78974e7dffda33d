//! Example program that reads a MIDI file and prints its header, tempo and the notes of every
//! track

use keyroll::{reader::MidiReadable, Midi};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .expect("Usage: notes <path to .mid file>");

    let data = path.get_midi_bytes().expect("Read MIDI file bytes");
    let midi = Midi::parse(&data).expect("Parse data as a Standard MIDI File");

    println!(
        "format {:?}, {} tracks, {:?} ticks per beat, {} bpm",
        midi.format(),
        midi.track_count(),
        midi.ticks_per_beat(),
        midi.bpm()
    );

    for (index, track) in midi.tracks().iter().enumerate() {
        println!("track {index}: {} notes, {} ticks", track.len(), track.length());

        for note in track.notes() {
            let name = note.name().unwrap_or_default();
            match note.duration() {
                Some(duration) => println!("  {name:>4} @ {:>6} for {duration}", note.start_time()),
                None => println!("  {name:>4} @ {:>6} never released", note.start_time()),
            }
        }
    }
}
